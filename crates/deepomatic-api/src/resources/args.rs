//! Argument templates validating create and update payloads

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// How a field behaves on create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    /// Must be given on create, may be updated
    Required,
    /// May be given on create, may be updated
    Optional,
    /// Must be given on create, never updated
    Immutable,
    /// May be given on create, never updated
    OptionalImmutable,
    /// Rejected on create, may be updated
    UpdateOnly,
}

impl Arg {
    pub fn is_required(&self) -> bool {
        matches!(self, Arg::Required | Arg::Immutable)
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, Arg::Required | Arg::Optional | Arg::UpdateOnly)
    }

    pub fn allowed_on_create(&self) -> bool {
        !matches!(self, Arg::UpdateOnly)
    }
}

/// Field names and their behavior
pub type Template = &'static [(&'static str, Arg)];

fn lookup(template: Template, name: &str) -> Option<Arg> {
    template
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, arg)| *arg)
}

/// Validate a create payload
///
/// Unknown and update-only fields are unexpected; every required field
/// must be present.
pub fn check_create(template: Template, data: &Map<String, Value>) -> Result<()> {
    for name in data.keys() {
        match lookup(template, name) {
            Some(arg) if arg.allowed_on_create() => {}
            _ => return Err(Error::UnexpectedArgument(name.clone())),
        }
    }
    for (name, arg) in template {
        if arg.is_required() && !data.contains_key(*name) {
            return Err(Error::MissingArgument(name.to_string()));
        }
    }
    Ok(())
}

/// Validate an update payload: only known, mutable fields
pub fn check_update(template: Template, data: &Map<String, Value>) -> Result<()> {
    for name in data.keys() {
        match lookup(template, name) {
            None => return Err(Error::UnexpectedArgument(name.clone())),
            Some(arg) if !arg.is_mutable() => {
                return Err(Error::ImmutableArgument(name.clone()))
            }
            Some(_) => {}
        }
    }
    Ok(())
}
