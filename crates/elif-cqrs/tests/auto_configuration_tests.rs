//! CQRS auto-configuration tests
//!
//! Covers conditional bus creation, property binding and custom bean
//! overrides, each against a freshly built component context.

use elif_context::{ConfigStore, ContextRunner};
use elif_cqrs::{
    CommandBus, CorrelationContext, CqrsAutoConfiguration, CqrsProperties, QueryBus, COMMAND_BUS,
    CQRS_ENABLED, CQRS_PROPERTIES,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stand-in command bus supplied by the application
struct RecordingCommandBus;

impl CommandBus for RecordingCommandBus {
    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn metrics_enabled(&self) -> bool {
        false
    }

    fn tracing_enabled(&self) -> bool {
        false
    }
}

fn context_runner() -> ContextRunner {
    ContextRunner::new()
        .with_configuration(CqrsAutoConfiguration)
        .with_default_bean::<CorrelationContext>()
}

#[test]
fn test_auto_configures_cqrs_when_enabled() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true"])
        .run(|context| {
            assert!(context.has_single_bean::<dyn CommandBus>());
            assert!(context.has_single_bean::<dyn QueryBus>());
            assert!(context.has_single_bean::<CorrelationContext>());

            let command_bus = context.get_bean::<dyn CommandBus>().unwrap();
            assert_eq!(command_bus.timeout(), Duration::from_secs(30));

            let query_bus = context.get_bean::<dyn QueryBus>().unwrap();
            assert_eq!(query_bus.timeout(), Duration::from_secs(15));
        })
        .unwrap();
}

#[test]
fn test_does_not_auto_configure_cqrs_when_disabled() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=false"])
        .run(|context| {
            assert!(context.does_not_have_bean::<dyn CommandBus>());
            assert!(context.does_not_have_bean::<dyn QueryBus>());
            assert!(context.does_not_have_bean::<CqrsProperties>());
            assert!(context.has_single_bean::<CorrelationContext>());
        })
        .unwrap();
}

#[test]
fn test_missing_flag_counts_as_disabled() {
    context_runner()
        .run(|context| {
            assert!(context.does_not_have_bean::<dyn CommandBus>());
            assert!(context.does_not_have_bean::<dyn QueryBus>());
        })
        .unwrap();
}

#[test]
fn test_binds_configuration_properties() {
    context_runner()
        .with_property_values(&[
            "elif.cqrs.enabled=true",
            "elif.cqrs.command.timeout-secs=10",
            "elif.cqrs.query.cache-ttl-secs=60",
        ])
        .run(|context| {
            assert!(context.has_single_bean::<CqrsProperties>());

            let properties = context.get_bean::<CqrsProperties>().unwrap();
            assert!(properties.enabled);
            assert_eq!(properties.command.timeout_secs, 10);
            assert_eq!(properties.query.cache_ttl_secs, 60);

            let query_bus = context.get_bean::<dyn QueryBus>().unwrap();
            assert_eq!(query_bus.cache_ttl(), Some(Duration::from_secs(60)));
        })
        .unwrap();
}

#[test]
fn test_supports_custom_bean_overrides() {
    let created = Arc::new(AtomicUsize::new(0));

    for flag in ["true", "false"] {
        let counter = created.clone();
        let enabled = format!("{}={}", CQRS_ENABLED, flag);

        context_runner()
            .with_property_values(&[enabled.as_str()])
            .with_bean::<dyn CommandBus, _>("customCommandBus", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(RecordingCommandBus)
            })
            .run(|context| {
                assert!(context.has_bean("customCommandBus"));

                let custom = context
                    .get_bean_named::<dyn CommandBus>("customCommandBus")
                    .unwrap();
                let again = context
                    .get_bean_named::<dyn CommandBus>("customCommandBus")
                    .unwrap();
                assert!(Arc::ptr_eq(&custom, &again));
                assert!(!custom.metrics_enabled());
            })
            .unwrap();
    }

    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn test_custom_bean_alongside_default_is_ambiguous_by_type() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true"])
        .with_bean::<dyn CommandBus, _>("customCommandBus", || Arc::new(RecordingCommandBus))
        .run(|context| {
            assert_eq!(
                context.bean_names_for_type::<dyn CommandBus>(),
                vec![COMMAND_BUS.to_string(), "customCommandBus".to_string()]
            );
            assert!(context.get_bean::<dyn CommandBus>().err().unwrap().is_ambiguous());
        })
        .unwrap();
}

#[test]
fn test_primary_custom_bean_wins_by_type() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true"])
        .with_primary_bean::<dyn CommandBus, _>("customCommandBus", || {
            Arc::new(RecordingCommandBus)
        })
        .run(|context| {
            let bus = context.get_bean::<dyn CommandBus>().unwrap();
            assert_eq!(bus.timeout(), Duration::from_secs(1));
        })
        .unwrap();
}

#[test]
fn test_override_with_default_name_replaces_default() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true"])
        .with_bean::<dyn CommandBus, _>(COMMAND_BUS, || Arc::new(RecordingCommandBus))
        .run(|context| {
            assert!(context.has_single_bean::<dyn CommandBus>());
            assert!(context.is_override(COMMAND_BUS));
            assert!(!context.get_bean::<dyn CommandBus>().unwrap().tracing_enabled());
        })
        .unwrap();
}

#[test]
fn test_buses_read_configuration_not_properties_override() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true", "elif.cqrs.command.timeout-secs=7"])
        .with_bean::<CqrsProperties, _>(CQRS_PROPERTIES, || {
            let mut properties = CqrsProperties::default();
            properties.command.timeout_secs = 99;
            Arc::new(properties)
        })
        .run(|context| {
            assert!(context.is_override(CQRS_PROPERTIES));
            let properties = context.get_bean::<CqrsProperties>().unwrap();
            assert_eq!(properties.command.timeout_secs, 99);

            let command_bus = context.get_bean::<dyn CommandBus>().unwrap();
            assert_eq!(command_bus.timeout(), Duration::from_secs(7));
        })
        .unwrap();
}

#[test]
fn test_queries_do_not_change_context() {
    context_runner()
        .with_property_values(&["elif.cqrs.enabled=true"])
        .run(|context| {
            let names = context.bean_names().to_vec();
            for _ in 0..3 {
                let _ = context.get_bean::<dyn QueryBus>();
                let _ = context.get_bean::<String>();
                assert!(context.has_bean(COMMAND_BUS));
            }
            assert_eq!(context.bean_names(), names.as_slice());
        })
        .unwrap();
}

#[test]
#[serial]
fn test_enabled_from_environment() {
    std::env::set_var("ELIF_CQRS_ENABLED", "true");
    std::env::set_var("ELIF_CQRS_QUERY__TIMEOUT_SECS", "4");

    let result = context_runner()
        .with_config(ConfigStore::from_env("elif.cqrs"))
        .run(|context| context.get_bean::<dyn QueryBus>().map(|bus| bus.timeout()));

    std::env::remove_var("ELIF_CQRS_ENABLED");
    std::env::remove_var("ELIF_CQRS_QUERY__TIMEOUT_SECS");

    assert_eq!(result.unwrap().unwrap(), Duration::from_secs(4));
}
