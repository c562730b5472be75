//! Compiling plans into actions
//!
//! Compilation checks every step up front, so an unknown action or a missing
//! parameter is reported before anything touches the UI.

use tracing::debug;

use super::action::{ActionCategory, ParsedAction};
use super::step::{Plan, Step};
use crate::driver::MouseClick;
use crate::engine::action::Action;
use crate::engine::combinators;
use crate::finder::Finder;
use crate::uiauto::UiContext;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("{0}")]
    Action(String),

    #[error("Unknown action '{uses}' in step '{step}'")]
    UnknownAction { step: String, uses: String },

    #[error("Step '{step}' is missing parameter '{parameter}'")]
    MissingParameter { step: String, parameter: &'static str },

    #[error("Step '{step}': {message}")]
    InvalidParameter { step: String, message: String },
}

/// Build the action for a whole plan. The plan's own timeout and interval
/// override those of `ui`.
pub fn compile(plan: &Plan, ui: &UiContext) -> Result<Action, PlanError> {
    let mut opts = ui.poll_opts();
    if let Some(timeout) = plan.timeout {
        opts = opts.with_timeout(timeout);
    }
    if let Some(interval) = plan.interval {
        opts = opts.with_interval(interval);
    }
    let ui = ui.with_poll_opts(opts);

    let steps = plan
        .steps
        .iter()
        .map(|step| compile_step(step, &ui))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Compiled plan {} ({} steps)", plan.name, steps.len());
    Ok(combinators::named(
        plan.name.clone(),
        combinators::combine(plan.name.clone(), steps),
    ))
}

pub fn compile_step(step: &Step, ui: &UiContext) -> Result<Action, PlanError> {
    let parsed = ParsedAction::parse(&step.uses).map_err(PlanError::Action)?;
    let action = match parsed.category {
        ActionCategory::Ui => {
            let ui = match step.timeout {
                Some(timeout) => ui.with_timeout(timeout),
                None => ui.clone(),
            };
            compile_ui(step, &parsed.action, &ui)?
        }
        ActionCategory::Flow => {
            let action = compile_flow(step, &parsed.action, ui)?;
            match step.timeout {
                Some(timeout) => combinators::with_timeout(timeout, action),
                None => action,
            }
        }
    };

    Ok(match &step.name {
        Some(name) => combinators::named(name.clone(), action),
        None => action,
    })
}

fn missing(step: &Step, parameter: &'static str) -> PlanError {
    PlanError::MissingParameter {
        step: step.label().to_string(),
        parameter,
    }
}

fn unknown(step: &Step) -> PlanError {
    PlanError::UnknownAction {
        step: step.label().to_string(),
        uses: step.uses.clone(),
    }
}

fn finder(step: &Step) -> Result<&Finder, PlanError> {
    let finder = step.finder.as_ref().ok_or_else(|| missing(step, "finder"))?;
    if finder.is_empty() {
        return Err(PlanError::InvalidParameter {
            step: step.label().to_string(),
            message: "finder has no constraints".to_string(),
        });
    }
    Ok(finder)
}

fn child(
    step: &Step,
    child: Option<&Step>,
    parameter: &'static str,
    ui: &UiContext,
) -> Result<Action, PlanError> {
    let child = child.ok_or_else(|| missing(step, parameter))?;
    compile_step(child, ui)
}

/// The child steps of `step` as one sequential action
fn children(step: &Step, ui: &UiContext) -> Result<Action, PlanError> {
    if step.steps.is_empty() {
        return Err(missing(step, "steps"));
    }
    let actions = step
        .steps
        .iter()
        .map(|s| compile_step(s, ui))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(combinators::combine(step.label().to_string(), actions))
}

fn compile_ui(step: &Step, action: &str, ui: &UiContext) -> Result<Action, PlanError> {
    let action = match action {
        "exists" => ui.exists(finder(step)?),
        "gone" => ui.gone(finder(step)?),
        "wait-until-exists" => ui.wait_until_exists(finder(step)?),
        "wait-until-gone" => ui.wait_until_gone(finder(step)?),
        "ensure-gone-for" => {
            let duration = step.duration.ok_or_else(|| missing(step, "duration"))?;
            ui.ensure_gone_for(finder(step)?, duration)
        }
        "wait-for-location" => ui.wait_for_location(finder(step)?),
        "left-click" => ui.left_click(finder(step)?),
        "right-click" => ui.right_click(finder(step)?),
        "double-click" => ui.double_click(finder(step)?),
        "click-until" => {
            let condition = child(step, step.condition.as_deref(), "condition", ui)?;
            ui.left_click_until(finder(step)?, condition)
        }
        "mouse-click" => {
            let point = step.point.ok_or_else(|| missing(step, "point"))?;
            ui.mouse_click_at(point, step.button.unwrap_or(MouseClick::Left))
        }
        "do-default" => ui.do_default(finder(step)?),
        "do-default-until" => {
            let condition = child(step, step.condition.as_deref(), "condition", ui)?;
            ui.do_default_until(finder(step)?, condition)
        }
        "focus" => ui.focus_and_wait(finder(step)?),
        "ensure-focused" => ui.ensure_focused(finder(step)?),
        "make-visible" => ui.make_visible(finder(step)?),
        "scroll" => {
            let direction = step.direction.ok_or_else(|| missing(step, "direction"))?;
            ui.scroll(finder(step)?, direction)
        }
        "check-restriction" => {
            let restriction = step.restriction.ok_or_else(|| missing(step, "restriction"))?;
            ui.check_restriction(finder(step)?, restriction)
        }
        "check-checked" => {
            let checked = step.checked.ok_or_else(|| missing(step, "checked"))?;
            ui.check_checked(finder(step)?, checked)
        }
        _ => return Err(unknown(step)),
    };
    Ok(action)
}

fn compile_flow(step: &Step, action: &str, ui: &UiContext) -> Result<Action, PlanError> {
    let action = match action {
        "combine" => {
            let actions = step
                .steps
                .iter()
                .map(|s| compile_step(s, ui))
                .collect::<Result<Vec<_>, _>>()?;
            combinators::combine(step.label().to_string(), actions)
        }
        // compile_step applies the name
        "named" if step.name.is_none() => return Err(missing(step, "name")),
        "named" => children(step, ui)?,
        "retry" => {
            let times = step.times.ok_or_else(|| missing(step, "times"))?;
            if times == 0 {
                return Err(PlanError::InvalidParameter {
                    step: step.label().to_string(),
                    message: "times must be at least 1".to_string(),
                });
            }
            ui.retry(times, children(step, ui)?)
        }
        "retry-until" => {
            let condition = child(step, step.condition.as_deref(), "condition", ui)?;
            ui.retry_until(children(step, ui)?, condition)
        }
        "if-success-then" => combinators::if_success_then(
            child(step, step.probe.as_deref(), "probe", ui)?,
            child(step, step.then.as_deref(), "then", ui)?,
        ),
        "if-fail-then" => combinators::if_fail_then(
            child(step, step.probe.as_deref(), "probe", ui)?,
            child(step, step.then.as_deref(), "then", ui)?,
        ),
        "sleep" => {
            let duration = step.duration.ok_or_else(|| missing(step, "duration"))?;
            combinators::sleep(duration)
        }
        "repeat" => {
            let times = step.times.ok_or_else(|| missing(step, "times"))?;
            combinators::repeat(times, children(step, ui)?)
        }
        _ => return Err(unknown(step)),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MemoryDriver, NodeInfo, TreeNode};
    use crate::finder::Role;
    use std::sync::Arc;
    use std::time::Duration;

    fn ui() -> UiContext {
        let driver = MemoryDriver::new(TreeNode::new(NodeInfo::new(Role::Desktop, "")));
        UiContext::new(Arc::new(driver))
    }

    fn step(yaml: &str) -> Step {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_unknown_action() {
        let err = compile_step(&step("uses: ui/teleport\nfinder: { name: OK }"), &ui()).unwrap_err();
        assert!(matches!(err, PlanError::UnknownAction { .. }));

        let err = compile_step(&step("uses: page/goto"), &ui()).unwrap_err();
        assert!(matches!(err, PlanError::Action(_)));
    }

    #[test]
    fn test_missing_parameters_name_the_step() {
        let err = compile_step(&step("name: click it\nuses: ui/left-click"), &ui()).unwrap_err();
        assert_eq!(err.to_string(), "Step 'click it' is missing parameter 'finder'");

        let err = compile_step(&step("uses: flow/sleep"), &ui()).unwrap_err();
        assert!(matches!(err, PlanError::MissingParameter { parameter: "duration", .. }));

        let err = compile_step(
            &step("uses: ui/click-until\nfinder: { name: OK }"),
            &ui(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::MissingParameter { parameter: "condition", .. }));
    }

    #[test]
    fn test_nested_errors_surface() {
        let yaml = r#"
uses: flow/retry
times: 2
steps:
  - uses: ui/scroll
    finder: { role: list }
"#;
        let err = compile_step(&step(yaml), &ui()).unwrap_err();
        assert!(matches!(err, PlanError::MissingParameter { parameter: "direction", .. }));
    }

    #[test]
    fn test_empty_finder_is_rejected() {
        let err = compile_step(&step("uses: ui/exists\nfinder: {}"), &ui()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { .. }));
    }

    #[test]
    fn test_plan_labels() {
        let plan = Plan {
            name: "smoke".to_string(),
            timeout: Some(Duration::from_secs(1)),
            interval: None,
            steps: vec![step("uses: flow/sleep\nduration: 10ms")],
        };
        let action = compile(&plan, &ui()).unwrap();
        assert_eq!(action.label(), Some("smoke"));
    }
}
