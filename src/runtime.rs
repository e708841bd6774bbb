//! Loads the bound action into a Lua state and invokes its entry point.

use std::fs;

use mlua::{Lua, LuaSerdeExt, Value as LuaValue};
use serde_json::{Map, Value};

use crate::error::ActivationError;
use crate::framing;
use crate::loader::{ActionLayout, ENTRY_SOURCE_FILENAME};
use crate::store::BoundAction;

/// Run one activation: load the entry source into a fresh Lua state, call
/// the bound entry point with `args`, and translate the returned table into
/// a JSON object.
///
/// The state is created per activation, so repeated loading has no
/// cross-activation side effects and the output rebinding installed by the
/// framer is torn down whether the call returns or fails.
pub fn invoke(
    layout: &ActionLayout,
    action: &BoundAction,
    args: Map<String, Value>,
) -> Result<Map<String, Value>, ActivationError> {
    let source = fs::read_to_string(&layout.entry_file)?;

    let lua = Lua::new();

    // The chunk's own output (top-level statements) is not activation log
    // content; only output produced during the entry-point call is.
    framing::silence_ambient_output(&lua)?;
    lua.load(&source).set_name(ENTRY_SOURCE_FILENAME).exec()?;

    let entry = match lua.globals().get::<LuaValue>(action.entry_point.as_str())? {
        LuaValue::Function(f) => f,
        _ => {
            return Err(ActivationError::MissingEntryPoint(
                action.entry_point.clone(),
            ));
        }
    };

    framing::redirect_ambient_output(&lua)?;
    let lua_args = lua.to_value(&Value::Object(args))?;
    let result = entry.call::<LuaValue>(lua_args)?;

    into_result_object(&lua, result)
}

/// Validate that the action returned a table and translate it into a JSON
/// object. String, integer and number keys become object keys; anything
/// else is a result-shape violation.
fn into_result_object(
    lua: &Lua,
    result: LuaValue,
) -> Result<Map<String, Value>, ActivationError> {
    let LuaValue::Table(table) = result else {
        tracing::error!(
            kind = result.type_name(),
            value = ?result,
            "action result is not a table"
        );
        return Err(ActivationError::NotADictionary);
    };

    let mut object = Map::new();
    for pair in table.pairs::<LuaValue, LuaValue>() {
        let (key, value) = pair?;
        let key = match key {
            LuaValue::String(s) => s.to_str()?.to_string(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => n.to_string(),
            other => {
                tracing::error!(kind = other.type_name(), "action result has a non-string key");
                return Err(ActivationError::NotADictionary);
            }
        };
        object.insert(key, lua.from_value(value)?);
    }

    Ok(object)
}
