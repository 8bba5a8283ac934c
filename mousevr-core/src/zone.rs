/// A zone crossing reported by the collision layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEvent {
    /// Full scene name of the crossed object
    pub name: String,
    /// Object identifier, e.g. `ldoor`, `end`, `target`
    pub object: String,
}

impl ZoneEvent {
    /// Decodes the `_object_r_` scene naming convention.
    ///
    /// Leading and trailing underscores are stripped and the rest must split
    /// into exactly two tokens; the second marks a trigger when it contains `r`.
    /// Anything else is decorative geometry and yields `None`.
    pub fn from_object_name(name: &str) -> Option<Self> {
        let tokens: Vec<&str> = name.trim_matches('_').split('_').collect();
        match tokens.as_slice() {
            [object, marker] if marker.contains('r') => Some(Self {
                name: name.to_string(),
                object: (*object).to_string(),
            }),
            _ => None,
        }
    }
}
