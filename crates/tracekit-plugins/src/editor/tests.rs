//! Unit tests for class editor builders and editors.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::error::ConstructionCause;
use crate::slot::SlotKind;
use crate::tests::{
    LabelInterceptor, RecordedEdit, RecordingClass, StubMethod, instrumentor,
    label_interceptor_type, plugin_context, refusing_interceptor_type, service_selector,
    trace_context,
};

const VALVE: &str = "org.apache.catalina.core.StandardHostValve";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[fixture]
fn context() -> Arc<PluginContext> {
    Arc::new(plugin_context())
}

#[fixture]
fn valve() -> Arc<RecordingClass> {
    Arc::new(
        RecordingClass::new(VALVE)
            .with_method(StubMethod::new("invoke", &["Request", "Response"]))
            .with_method(StubMethod::new("invoke", &["Request"]).without_descriptor()),
    )
}

fn as_class(recording: &Arc<RecordingClass>) -> Arc<dyn InstrumentClass> {
    Arc::clone(recording) as Arc<dyn InstrumentClass>
}

fn build(builder: &ClassEditorBuilder, context: &Arc<PluginContext>) -> ClassEditor {
    builder
        .build(context, trace_context(), instrumentor())
        .expect("build editor")
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[rstest]
#[case(MethodSelector::named("invoke"), "invoke(..)")]
#[case(service_selector(), "invoke(Request, Response)")]
#[case(MethodSelector::with_parameters("close", Vec::<String>::new()), "close()")]
fn selector_display(#[case] selector: MethodSelector, #[case] expected: &str) {
    assert_eq!(selector.to_string(), expected);
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[rstest]
fn build_requires_target(context: Arc<PluginContext>) {
    let mut builder = ClassEditorBuilder::default();
    builder.inject_metadata("traceId");
    let err = builder
        .build(&context, trace_context(), instrumentor())
        .expect_err("missing target");
    assert!(matches!(err, PluginError::InvalidEditor { .. }));
    assert!(context.metadata_slot("traceId").is_none());
}

#[rstest]
fn build_allocates_slots_in_declaration_order(context: Arc<PluginContext>) {
    let mut builder = ClassEditorBuilder::default();
    builder
        .target(VALVE)
        .inject_metadata("traceId")
        .inject_metadata("asyncId")
        .inject_field_snooper("request");
    let editor = build(&builder, &context);

    assert_eq!(editor.target_class_name(), VALVE);
    let metadata: Vec<_> = editor
        .metadata_slots()
        .iter()
        .map(|(name, slot)| (name.as_str(), slot.index()))
        .collect();
    assert_eq!(metadata, vec![("traceId", 0), ("asyncId", 1)]);
    let snoopers: Vec<_> = editor
        .field_snoop_slots()
        .iter()
        .map(|(name, slot)| (name.as_str(), slot.index()))
        .collect();
    assert_eq!(snoopers, vec![("request", 0)]);
}

#[rstest]
fn rebuilding_reuses_slots(context: Arc<PluginContext>) {
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_metadata("traceId");
    let first = build(&builder, &context);
    let second = build(&builder, &context);
    assert_eq!(first.metadata_slots(), second.metadata_slots());
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[rstest]
fn edit_applies_slots_then_interceptors(
    context: Arc<PluginContext>,
    valve: Arc<RecordingClass>,
) {
    let mut builder = ClassEditorBuilder::default();
    builder
        .target(VALVE)
        .inject_metadata("traceId")
        .inject_field_snooper("request")
        .inject_interceptor(
            service_selector(),
            label_interceptor_type(),
            vec![Value::from("valve")],
        );
    let editor = build(&builder, &context);

    editor.edit(&as_class(&valve)).expect("edit");

    let edits = valve.take_edits();
    let [
        RecordedEdit::Metadata(metadata, metadata_slot),
        RecordedEdit::FieldSnooper(field, snoop_slot),
        RecordedEdit::Interceptor(method, interceptor),
    ] = edits.as_slice()
    else {
        panic!("unexpected edits: {edits:?}");
    };
    assert_eq!((metadata.as_str(), metadata_slot.kind()), ("traceId", SlotKind::Metadata));
    assert_eq!((field.as_str(), snoop_slot.kind()), ("request", SlotKind::FieldSnoop));
    assert_eq!(method, "invoke");
    let label = interceptor
        .downcast_ref::<LabelInterceptor>()
        .expect("label interceptor");
    assert_eq!(label.label.as_deref(), Some("valve"));
    assert!(label.traced);
    assert_eq!(label.method.as_deref(), Some("invoke"));
}

#[rstest]
fn edit_selects_overload_by_parameter_types(
    context: Arc<PluginContext>,
    valve: Arc<RecordingClass>,
) {
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_interceptor(
        MethodSelector::with_parameters("invoke", ["Request"]),
        label_interceptor_type(),
        vec![Value::from("single")],
    );
    let editor = build(&builder, &context);

    editor.edit(&as_class(&valve)).expect("edit");
    assert_eq!(valve.edit_count(), 1);
}

#[rstest]
fn edit_rejects_other_class(context: Arc<PluginContext>) {
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_metadata("traceId");
    let editor = build(&builder, &context);
    let other = Arc::new(RecordingClass::new("org.eclipse.jetty.server.Server"));

    let err = editor.edit(&as_class(&other)).expect_err("wrong class");
    assert!(matches!(err, PluginError::InvalidEditor { .. }));
    assert_eq!(other.edit_count(), 0);
}

#[rstest]
fn edit_reports_missing_method(context: Arc<PluginContext>, valve: Arc<RecordingClass>) {
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_metadata("traceId").inject_interceptor(
        MethodSelector::named("service"),
        label_interceptor_type(),
        vec![Value::from("valve")],
    );
    let editor = build(&builder, &context);

    let err = editor.edit(&as_class(&valve)).expect_err("missing method");
    match err {
        PluginError::MethodNotFound { class_name, method } => {
            assert_eq!(class_name, VALVE);
            assert_eq!(method, "service(..)");
        }
        other => panic!("expected MethodNotFound, got {other}"),
    }
    assert_eq!(valve.edit_count(), 0);
}

#[rstest]
fn construction_failure_leaves_class_untouched(
    context: Arc<PluginContext>,
    valve: Arc<RecordingClass>,
) {
    let mut builder = ClassEditorBuilder::default();
    builder
        .target(VALVE)
        .inject_metadata("traceId")
        .inject_interceptor(service_selector(), label_interceptor_type(), Vec::new());
    let editor = build(&builder, &context);

    let err = editor.edit(&as_class(&valve)).expect_err("missing label");
    match err {
        PluginError::ConstructionFailed { interceptor, cause } => {
            assert_eq!(interceptor, "LabelInterceptor");
            assert!(matches!(cause, ConstructionCause::MissingArgument { .. }));
        }
        other => panic!("expected ConstructionFailed, got {other}"),
    }
    assert_eq!(valve.edit_count(), 0);
}

#[rstest]
fn factory_failure_is_reported(context: Arc<PluginContext>, valve: Arc<RecordingClass>) {
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_interceptor(
        service_selector(),
        refusing_interceptor_type(),
        vec![Value::Int(3)],
    );
    let editor = build(&builder, &context);

    let err = editor.edit(&as_class(&valve)).expect_err("refused");
    assert!(matches!(
        err,
        PluginError::ConstructionFailed {
            cause: ConstructionCause::Factory { .. },
            ..
        }
    ));
}

#[rstest]
fn instrument_errors_name_the_class(context: Arc<PluginContext>) {
    let rejecting = Arc::new(
        RecordingClass::new(VALVE)
            .with_method(StubMethod::new("invoke", &["Request", "Response"]))
            .rejecting_interceptors(),
    );
    let mut builder = ClassEditorBuilder::default();
    builder.target(VALVE).inject_interceptor(
        service_selector(),
        label_interceptor_type(),
        vec![Value::from("valve")],
    );
    let editor = build(&builder, &context);

    let err = editor.edit(&as_class(&rejecting)).expect_err("rejected");
    match err {
        PluginError::Instrument { class_name, source } => {
            assert_eq!(class_name, VALVE);
            assert!(source.message().contains("invoke"));
        }
        other => panic!("expected Instrument, got {other}"),
    }
}
