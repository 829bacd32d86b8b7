//! Import result intake.
//!
//! The entry point the host calls to hand a resolver's reply to the
//! compilation waiting on it. The reply value is untyped and interpreted
//! polymorphically; the constructed import list is deposited on the
//! compilation context and the trampoline's wait is signaled.

use serde_json::Value;
use std::ptr;
use tracing::debug;

use sable_ffi::{
    sable_delete_import_list, sable_import_list_set, sable_make_import_entry,
    sable_make_import_list, SableImport, SableImportList,
};

use crate::buffer::TransferBuffer;
use crate::error::DeliveryError;
use crate::registry;
use crate::DeliveryToken;

/// Deliver a resolver's reply to the compilation identified by `token`.
///
/// The token is consumed: it cannot be replayed, and a token whose
/// compilation has finished is rejected with
/// [`DeliveryError::StaleKey`].
///
/// The reply is interpreted as follows:
/// - an **array** produces one import entry per object element, reading
///   the `file` and `contents` fields; non-object elements are skipped
/// - a single **object** is equivalent to a one-element array
/// - **anything else** means "use the requested path unchanged", deferring
///   to the engine's own disk resolution
///
/// Empty-string `contents` are treated exactly like absent `contents`
/// (resolve from disk). A legitimately empty virtual file is therefore
/// inexpressible through this interface.
pub fn deliver_imports(reply: &Value, token: DeliveryToken) -> Result<(), DeliveryError> {
    let DeliveryToken { key } = token;
    let Some(cell) = registry::lookup(key) else {
        return Err(DeliveryError::StaleKey);
    };

    let mut state = cell.state.lock();
    let requested = state.pending.requested.clone().unwrap_or_default();
    let list = build_import_list(reply, &requested);
    if let Some(stale) = state.pending.list.replace(list) {
        unsafe { sable_delete_import_list(stale) };
    }
    state.pending.delivered = true;
    debug!(requested = %requested, "import reply delivered");
    cell.delivered.notify_one();
    Ok(())
}

fn build_import_list(reply: &Value, requested: &str) -> *mut SableImportList {
    unsafe {
        match reply {
            Value::Array(items) => {
                let list = sable_make_import_list(items.len());
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() {
                        sable_import_list_set(list, index, entry_from_object(item));
                    }
                    // non-object elements leave their slot empty; the
                    // engine skips empty slots
                }
                list
            }
            Value::Object(_) => {
                let list = sable_make_import_list(1);
                sable_import_list_set(list, 0, entry_from_object(reply));
                list
            }
            _ => {
                let list = sable_make_import_list(1);
                let entry = sable_make_import_entry(
                    TransferBuffer::from_str_lossy(requested).into_raw(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                );
                sable_import_list_set(list, 0, entry);
                list
            }
        }
    }
}

unsafe fn entry_from_object(object: &Value) -> *mut SableImport {
    let path = TransferBuffer::from_value(object.get("file"));
    // empty contents and absent contents are the same thing: resolve the
    // path from disk
    let contents = match object.get("contents") {
        Some(Value::String(text)) if !text.is_empty() => {
            TransferBuffer::from_str_lossy(text).into_raw()
        }
        _ => ptr::null_mut(),
    };
    sable_make_import_entry(path.into_raw(), contents, ptr::null_mut())
}
