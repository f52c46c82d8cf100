pub(crate) mod answer_store;
pub(crate) mod attempts;
pub(crate) mod grader;
pub(crate) mod notifier;
pub(crate) mod timer_registry;
