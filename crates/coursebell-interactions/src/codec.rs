//! Component identifier codec.
//!
//! Interactive elements carry an opaque identifier of the form
//! `<action_name>-<id>-<id>-...`, one base-10 integer per declared argument
//! key. `encode` and `decode` are pure: same input, same output, no side
//! effects. Decoding treats the identifier as untrusted and fails closed.

use coursebell_core::error::{CourseBellError, Result};

use crate::actions::{ActionRegistry, ActionSpec, CallbackClass};

/// Hard platform bound on component identifiers. The codec never truncates;
/// callers keep encoded ids under this limit.
pub const MAX_COMPONENT_ID_LEN: usize = 100;

/// Whether an encoded identifier fits the platform's component-id limit.
pub fn fits_component_id(id: &str) -> bool {
    id.len() <= MAX_COMPONENT_ID_LEN
}

/// Ordered argument map produced by `decode`. Keys are the action's declared
/// argument keys, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgMap {
    entries: Vec<(&'static str, i64)>,
}

impl ArgMap {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn from_entries(entries: Vec<(&'static str, i64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Like `get`, but a missing key is an `InvalidState` error — used by
    /// handlers that have already passed decode validation.
    pub fn require(&self, key: &str) -> Result<i64> {
        self.get(key)
            .ok_or_else(|| CourseBellError::InvalidState(format!("missing argument '{key}'")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.entries.iter().copied()
    }

    /// Argument values in declared order.
    pub fn values(&self) -> Vec<i64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }
}

/// A decoded component callback: the resolved action plus its arguments.
#[derive(Debug, Clone)]
pub struct DecodedAction {
    pub spec: &'static ActionSpec,
    pub args: ArgMap,
}

/// Encode an action and its argument values into a component identifier.
/// Fails when the value count does not match the action's declared arity.
pub fn encode(spec: &ActionSpec, ids: &[i64]) -> Result<String> {
    if ids.len() != spec.arity() {
        return Err(CourseBellError::ArgumentCountMismatch {
            action: spec.name.to_string(),
            expected: spec.arity(),
            actual: ids.len(),
        });
    }
    let mut out = String::from(spec.name);
    for id in ids {
        out.push('-');
        out.push_str(&id.to_string());
    }
    Ok(out)
}

/// Decode a component identifier against one callback namespace.
///
/// Validation order matches the wire contract: unknown name, then argument
/// count, then argument parse. The argument map is never partially
/// populated — the first bad token fails the whole decode.
pub fn decode(
    registry: &ActionRegistry,
    class: CallbackClass,
    identifier: &str,
) -> Result<DecodedAction> {
    let mut tokens = identifier.split('-');
    // split() always yields at least one token, possibly empty
    let name = tokens.next().unwrap_or_default();

    let spec = registry
        .lookup(class, name)
        .ok_or_else(|| CourseBellError::UnsupportedAction(name.to_string()))?;

    let raw_args: Vec<&str> = tokens.collect();
    if raw_args.len() != spec.arity() {
        return Err(CourseBellError::ArgumentCountMismatch {
            action: spec.name.to_string(),
            expected: spec.arity(),
            actual: raw_args.len(),
        });
    }

    let mut entries = Vec::with_capacity(spec.arity());
    for (key, token) in spec.arg_keys.iter().zip(raw_args) {
        let value: i64 = token
            .parse()
            .map_err(|_| CourseBellError::ArgumentParseError {
                action: spec.name.to_string(),
                token: token.to_string(),
            })?;
        entries.push((*key, value));
    }

    Ok(DecodedAction {
        spec,
        args: ArgMap::from_entries(entries),
    })
}
