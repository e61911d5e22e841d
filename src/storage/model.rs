use crate::definition::DefinitionId;

/// User-supplied fields for creating or editing a definition. A missing id
/// means "create new"; the store generates one.
pub struct DefinitionDraft {
    pub id: Option<DefinitionId>,
    pub text: String,
    pub interval: f64,
    pub jitter: f64,
    pub sound: bool,
}
