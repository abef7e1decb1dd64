//! Plan checks.

use std::collections::HashSet;

use super::{Severity, ValidationIssue};
use crate::apis::desired::DesiredPlan;
use crate::plan::PlanMode;

pub fn check_plans(plans: &[DesiredPlan]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut keys = HashSet::new();
    let mut ids = HashSet::new();

    for plan in plans {
        let label = if plan.key.is_empty() { &plan.name } else { &plan.key };
        if plan.name.trim().is_empty() {
            issues.push(severe(format!("Plan [{label}] must have a name")));
        }
        if !keys.insert(plan.key.as_str()) {
            issues.push(severe(format!("Plan key [{label}] is used more than once")));
        }
        if let Some(id) = plan.id.as_deref() {
            if !ids.insert(id) {
                issues.push(severe(format!("Plan id [{id}] is used more than once")));
            }
        }
        match (plan.mode, &plan.security) {
            (PlanMode::Push, Some(_)) => {
                issues.push(severe(format!("Push plan [{label}] cannot define a security")));
            }
            (PlanMode::Standard, None) => {
                issues.push(severe(format!("Plan [{label}] must define a security")));
            }
            _ => {}
        }
    }
    issues
}

fn severe(message: String) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Severe,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanSecurity, PlanSecurityType};

    fn plan(key: &str, mode: PlanMode, security: Option<PlanSecurity>) -> DesiredPlan {
        DesiredPlan {
            key: key.into(),
            id: None,
            cross_id: None,
            name: key.into(),
            description: None,
            status: Default::default(),
            security,
            mode,
            validation: Default::default(),
            order: 0,
            characteristics: vec![],
            excluded_groups: vec![],
            tags: vec![],
            selection_rule: None,
            comment_required: false,
            comment_message: None,
            general_conditions: None,
            flows: vec![],
        }
    }

    #[test]
    fn test_security_follows_mode() {
        let keyless = Some(PlanSecurity::of(PlanSecurityType::KeyLess));
        assert!(check_plans(&[plan("a", PlanMode::Standard, keyless.clone())]).is_empty());
        assert!(check_plans(&[plan("b", PlanMode::Push, None)]).is_empty());
        assert_eq!(check_plans(&[plan("c", PlanMode::Standard, None)]).len(), 1);
        assert_eq!(check_plans(&[plan("d", PlanMode::Push, keyless)]).len(), 1);
    }
}
