mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use ui_actions::driver::{DriverEvent, MouseClick, Point};
use ui_actions::plan::{compile, PlanError, PlanLoader};
use ui_actions::prelude::*;
use ui_actions::EngineConfig;

const ENABLE_WIFI: &str = r#"
name: enable wifi
timeout: 1s
interval: 50ms
steps:
  - uses: ui/wait-until-exists
    finder: { name: Settings, role: window }
  - name: open bluetooth
    uses: ui/left-click
    finder: { name: Bluetooth }
  - uses: flow/if-fail-then
    probe:
      uses: ui/check-checked
      finder: { name: Wi-Fi }
      checked: "true"
    then:
      uses: ui/do-default
      finder: { name: Wi-Fi }
"#;

const MISSING_HEADSET: &str = r#"
name: pair headset
timeout: 300ms
steps:
  - name: find headset
    uses: ui/wait-until-exists
    finder: { name: Headset }
"#;

#[tokio::test(start_paused = true)]
async fn test_directory_of_plans_runs_in_order() {
    let dir = create_test_dir();
    write_file(dir.path(), "01-enable-wifi.yaml", ENABLE_WIFI);
    write_file(dir.path(), "02-pair-headset.yml", MISSING_HEADSET);
    write_file(dir.path(), "config.yaml", "timeout: 2s\noutput_dir: null\n");

    let config = EngineConfig::load(dir.path().join("config.yaml")).unwrap();
    assert_eq!(config.output_dir, None);

    let plans = PlanLoader::load_directory(dir.path()).unwrap();
    let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["enable wifi", "pair headset"]);

    let driver = memory_driver(settings_tree());
    let ui = UiContext::from_config(Arc::new(driver.clone()), &config);
    let runner = Runner::from_config(Arc::new(driver.clone()), &config);

    let mut results = Vec::new();
    for plan in &plans {
        let action = compile(plan, &ui).unwrap();
        results.push(runner.run(&plan.name, &action).await);
    }

    assert_eq!(results[0].verdict, Verdict::Passed);
    assert_eq!(
        driver.events(),
        vec![
            DriverEvent::MouseClick { point: Point::new(170, 160), click: MouseClick::Left },
            DriverEvent::DoDefault { node: "Wi-Fi".into() },
        ]
    );

    let failed = &results[1];
    assert_eq!(failed.verdict, Verdict::Failed);
    assert!(failed.dump_dir.is_none());
    let err = failed.error.as_ref().unwrap();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("find headset"));
    // The plan's own timeout wins over the configured one
    assert!(failed.elapsed < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_retry_until_plan() {
    let driver = memory_driver(desktop(vec![dialog("Update", &["Later"])]));
    driver.on_event(move |event, tree| {
        if matches!(event, DriverEvent::MouseClick { .. }) {
            tree.children.clear();
        }
    });

    let plan = serde_yaml::from_str(
        r#"
name: dismiss update
steps:
  - uses: flow/retry-until
    steps:
      - uses: ui/left-click
        finder: { name: Later }
    condition:
      uses: ui/gone
      finder: { role: dialog }
"#,
    )
    .unwrap();

    let action = compile(&plan, &fast_ui(&driver)).unwrap();
    action.run(&Context::new()).await.unwrap();
    assert_eq!(driver.clicks(), vec![Point::new(470, 460)]);
}

#[test]
fn test_compile_reports_bad_steps_before_running() {
    let driver = memory_driver(settings_tree());
    let ui = fast_ui(&driver);

    let plan = serde_yaml::from_str(
        r#"
name: broken
steps:
  - uses: ui/left-click
    finder: { name: OK }
  - name: scroll the list
    uses: ui/scroll
    finder: { role: list }
"#,
    )
    .unwrap();
    let err = compile(&plan, &ui).unwrap_err();
    assert!(matches!(err, PlanError::MissingParameter { parameter: "direction", .. }));
    assert_eq!(err.to_string(), "Step 'scroll the list' is missing parameter 'direction'");
    assert!(driver.events().is_empty());
}

#[test]
fn test_load_file_with_bad_yaml_names_the_file() {
    let dir = create_test_dir();
    write_file(dir.path(), "broken.yaml", "name: [unclosed\n");

    let err = PlanLoader::load_file(&dir.path().join("broken.yaml")).unwrap_err();
    assert!(err.to_string().contains("broken.yaml"));
}
