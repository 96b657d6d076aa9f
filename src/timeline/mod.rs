pub(crate) mod captions;
pub(crate) mod reconcile;
pub(crate) mod track;
