//! Output framing for activations.
//!
//! The action's ambient output primitives (`print`, `io.write`) are rebound
//! to host functions whose sink is the container's real stdout, so user
//! output reaches the external log collector and never the HTTP response
//! body. The rebinding lives inside the per-activation Lua state and dies
//! with it, on every exit path.
//!
//! After each activation (and after every failed request) a fixed sentinel
//! line is written to stdout and stderr so the collector can delimit the
//! activation's logs.

use std::io::{self, Write};

use mlua::{Lua, Table, Value, Variadic};

/// Marker line delimiting the end of one activation's log output.
pub const ACTIVATION_SENTINEL: &str = "XXX_THE_END_OF_A_WHISK_ACTIVATION_XXX";

/// Rebind `print` and `io.write` to write to the real stdout.
///
/// Installed after the action chunk has loaded, immediately before the
/// entry point is called.
pub fn redirect_ambient_output(lua: &Lua) -> mlua::Result<()> {
    install_output_writer(lua, |text| {
        let mut out = io::stdout().lock();
        if out.write_all(text.as_bytes()).and_then(|_| out.flush()).is_err() {
            tracing::warn!("failed to forward action output to stdout");
        }
    })
}

/// Rebind `print` and `io.write` to a discarding sink.
///
/// Output produced while the action chunk itself loads is not part of any
/// activation and is swallowed.
pub fn silence_ambient_output(lua: &Lua) -> mlua::Result<()> {
    install_output_writer(lua, |_| {})
}

fn install_output_writer<F>(lua: &Lua, sink: F) -> mlua::Result<()>
where
    F: Fn(&str) + Clone + 'static,
{
    let print_sink = sink.clone();
    let print = lua.create_function(move |_, args: Variadic<Value>| {
        let mut line = String::new();
        for (i, value) in args.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            line.push_str(&value.to_string()?);
        }
        line.push('\n');
        print_sink(&line);
        Ok(())
    })?;
    lua.globals().set("print", print)?;

    let write = lua.create_function(move |_, args: Variadic<Value>| {
        let mut chunk = String::new();
        for value in args.iter() {
            chunk.push_str(&value.to_string()?);
        }
        sink(&chunk);
        Ok(())
    })?;
    let io_table: Table = lua.globals().get("io")?;
    io_table.set("write", write)?;

    Ok(())
}

/// Write a disclosed failure message to stdout as activation log content.
pub fn log_to_stdout(message: &str) {
    let mut out = io::stdout().lock();
    if out.write_all(message.as_bytes()).and_then(|_| out.flush()).is_err() {
        tracing::warn!("failed to write failure message to stdout");
    }
}

/// Emit the end-of-activation sentinel pair.
///
/// The stdout marker carries a leading newline so it sits on its own line
/// even when the action's last write had no trailing newline; the stderr
/// marker does not.
pub fn emit_activation_end() {
    let mut out = io::stdout().lock();
    if write_end_marker(&mut out, true).and_then(|_| out.flush()).is_err() {
        tracing::warn!("failed to write activation sentinel to stdout");
    }
    drop(out);

    let mut err = io::stderr().lock();
    if write_end_marker(&mut err, false).and_then(|_| err.flush()).is_err() {
        tracing::warn!("failed to write activation sentinel to stderr");
    }
}

fn write_end_marker<W: Write>(writer: &mut W, leading_newline: bool) -> io::Result<()> {
    if leading_newline {
        writer.write_all(b"\n")?;
    }
    writer.write_all(ACTIVATION_SENTINEL.as_bytes())?;
    writer.write_all(b"\n")
}
