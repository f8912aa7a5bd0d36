//! Crate-level integration and BDD tests, plus stub collaborators shared by
//! the unit tests.


use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use tracekit_config::AgentConfig;

use crate::ambient::{
    AmbientKind, ByteCodeInstrumentor, InstrumentClass, MethodDescriptor, MethodInfo, TraceContext,
};
use crate::context::PluginContext;
use crate::editor::MethodSelector;
use crate::error::{ConstructionCause, InstrumentError};
use crate::interceptor::{Interceptor, InterceptorType, Param, ValueType};
use crate::slot::Slot;

// ---------------------------------------------------------------------------
// Agent services
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct StubTraceContext;

impl TraceContext for StubTraceContext {}

#[derive(Debug, Default)]
pub(crate) struct StubInstrumentor;

impl ByteCodeInstrumentor for StubInstrumentor {}

pub(crate) fn trace_context() -> Arc<dyn TraceContext> {
    Arc::new(StubTraceContext)
}

pub(crate) fn instrumentor() -> Arc<dyn ByteCodeInstrumentor> {
    Arc::new(StubInstrumentor)
}

// ---------------------------------------------------------------------------
// Classes and methods
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct StubDescriptor(pub(crate) String);

impl MethodDescriptor for StubDescriptor {
    fn full_name(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug)]
pub(crate) struct StubMethod {
    name: String,
    parameter_types: Vec<String>,
    with_descriptor: bool,
}

impl StubMethod {
    pub(crate) fn new(name: &str, parameter_types: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            parameter_types: parameter_types.iter().map(|ty| (*ty).to_owned()).collect(),
            with_descriptor: true,
        }
    }

    pub(crate) fn without_descriptor(mut self) -> Self {
        self.with_descriptor = false;
        self
    }
}

impl MethodInfo for StubMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    fn descriptor(&self) -> Option<Arc<dyn MethodDescriptor>> {
        self.with_descriptor.then(|| {
            Arc::new(StubDescriptor(format!(
                "{}({})",
                self.name,
                self.parameter_types.join(", ")
            ))) as Arc<dyn MethodDescriptor>
        })
    }
}

/// Edit recorded by [`RecordingClass`].
#[derive(Debug)]
pub(crate) enum RecordedEdit {
    Metadata(String, Slot),
    FieldSnooper(String, Slot),
    Interceptor(String, Box<dyn Interceptor>),
}

/// Class stub that records every edit applied to it.
#[derive(Debug)]
pub(crate) struct RecordingClass {
    name: String,
    methods: Vec<Arc<dyn MethodInfo>>,
    edits: Mutex<Vec<RecordedEdit>>,
    reject_interceptors: bool,
}

impl RecordingClass {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            methods: Vec::new(),
            edits: Mutex::new(Vec::new()),
            reject_interceptors: false,
        }
    }

    pub(crate) fn with_method(mut self, method: StubMethod) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub(crate) fn rejecting_interceptors(mut self) -> Self {
        self.reject_interceptors = true;
        self
    }

    pub(crate) fn edit_count(&self) -> usize {
        self.edits.lock().len()
    }

    pub(crate) fn take_edits(&self) -> Vec<RecordedEdit> {
        std::mem::take(&mut *self.edits.lock())
    }
}

impl InstrumentClass for RecordingClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_method(
        &self,
        name: &str,
        parameter_types: Option<&[String]>,
    ) -> Option<Arc<dyn MethodInfo>> {
        self.methods
            .iter()
            .find(|method| {
                method.name() == name
                    && parameter_types.is_none_or(|types| method.parameter_types() == types)
            })
            .cloned()
    }

    fn add_metadata(&self, name: &str, slot: Slot) -> Result<(), InstrumentError> {
        self.edits
            .lock()
            .push(RecordedEdit::Metadata(name.to_owned(), slot));
        Ok(())
    }

    fn add_field_snooper(&self, field: &str, slot: Slot) -> Result<(), InstrumentError> {
        self.edits
            .lock()
            .push(RecordedEdit::FieldSnooper(field.to_owned(), slot));
        Ok(())
    }

    fn add_interceptor(
        &self,
        method: &Arc<dyn MethodInfo>,
        interceptor: Box<dyn Interceptor>,
    ) -> Result<(), InstrumentError> {
        if self.reject_interceptors {
            return Err(InstrumentError::new(format!(
                "cannot rewrite method '{}'",
                method.name()
            )));
        }
        self.edits
            .lock()
            .push(RecordedEdit::Interceptor(method.name().to_owned(), interceptor));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interceptors
// ---------------------------------------------------------------------------

/// Interceptor that remembers a label and whether it saw a trace context.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LabelInterceptor {
    pub(crate) label: Option<String>,
    pub(crate) traced: bool,
    pub(crate) method: Option<String>,
}

impl Interceptor for LabelInterceptor {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `LabelInterceptor(TraceContext, MethodInfo, String!)`.
pub(crate) fn label_interceptor_type() -> Arc<InterceptorType> {
    let ty = InterceptorType::builder("LabelInterceptor")
        .constructor(
            [
                Param::ambient(AmbientKind::TraceContext),
                Param::ambient(AmbientKind::TargetMethod),
                Param::required(ValueType::String),
            ],
            |args| {
                let traced = args.next_trace_context()?.is_some();
                let method = args.next_target_method()?.map(|m| m.name().to_owned());
                let label = args.next_string()?;
                Ok(Box::new(LabelInterceptor {
                    label,
                    traced,
                    method,
                }))
            },
        )
        .build()
        .expect("valid interceptor type");
    Arc::new(ty)
}

/// Interceptor type whose only constructor always refuses to build.
pub(crate) fn refusing_interceptor_type() -> Arc<InterceptorType> {
    let ty = InterceptorType::builder("RefusingInterceptor")
        .constructor([Param::required(ValueType::Int)], |_args| {
            Err(ConstructionCause::Factory {
                message: String::from("refused"),
            })
        })
        .build()
        .expect("valid interceptor type");
    Arc::new(ty)
}

pub(crate) fn plugin_context() -> PluginContext {
    PluginContext::new(Arc::new(AgentConfig::default()))
}

pub(crate) fn service_selector() -> MethodSelector {
    MethodSelector::with_parameters("invoke", ["Request", "Response"])
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn plugin_declares_and_applies_class_edits() {
    let mut context = plugin_context();
    context
        .new_class_editor_builder()
        .target("org.apache.catalina.core.StandardHostValve")
        .inject_metadata("traceId")
        .inject_field_snooper("request")
        .inject_interceptor(
            service_selector(),
            label_interceptor_type(),
            vec!["tomcat".into()],
        );
    let shared = Arc::new(context);

    let editors = shared
        .class_editors(&trace_context(), &instrumentor())
        .expect("build editors");
    assert_eq!(editors.len(), 1);

    let recording = Arc::new(
        RecordingClass::new("org.apache.catalina.core.StandardHostValve")
            .with_method(StubMethod::new("invoke", &["Request", "Response"])),
    );
    let class: Arc<dyn InstrumentClass> = Arc::clone(&recording) as Arc<dyn InstrumentClass>;
    editors
        .first()
        .expect("one editor")
        .edit(&class)
        .expect("edit class");

    let edits = recording.take_edits();
    assert_eq!(edits.len(), 3);
    let installed = edits
        .iter()
        .find_map(|edit| match edit {
            RecordedEdit::Interceptor(method, interceptor) => Some((method, interceptor)),
            _ => None,
        })
        .expect("interceptor installed");
    assert_eq!(installed.0, "invoke");
    let label = installed
        .1
        .downcast_ref::<LabelInterceptor>()
        .expect("label interceptor");
    assert_eq!(
        label,
        &LabelInterceptor {
            label: Some(String::from("tomcat")),
            traced: true,
            method: Some(String::from("invoke")),
        }
    );
    assert_eq!(
        shared.metadata_slot("traceId").map(|slot| slot.index()),
        Some(0)
    );
}
