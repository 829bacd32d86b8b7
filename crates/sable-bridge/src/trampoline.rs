//! The import trampoline.
//!
//! This is the engine-side callback registered for every compilation that
//! has a host resolver. The engine invokes it synchronously, mid-compile,
//! once per import; the trampoline forwards the request to the resolver
//! and does not return until the resolver (or another thread it handed
//! the token to) has produced a reply through
//! [`deliver_imports`](crate::deliver_imports), the wait times out, or
//! the resolver declines to deliver.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::time::Instant;

use sable_ffi::{
    sable_delete_import_list, sable_import_list_set, sable_import_set_error,
    sable_make_import_entry, sable_make_import_list, SableImportList,
};
use tracing::debug;

use crate::buffer::TransferBuffer;
use crate::registry::{self, DeliveryKey};
use crate::{DeliveryToken, ImportRequest};

/// Engine-facing importer callback.
///
/// # Safety
/// Invoked by the engine with path buffers valid only for the duration of
/// the call and the cookie registered via the context's options.
pub(crate) unsafe extern "C" fn import_trampoline(
    path: *const c_char,
    parent: *const c_char,
    cookie: *mut c_void,
) -> *mut SableImportList {
    // Copy both paths immediately: the engine owns these buffers and may
    // reuse or free them once this call returns.
    let requested = copy_path(path);
    let parent = copy_path(parent);

    if cookie.is_null() {
        return ptr::null_mut();
    }
    let key: DeliveryKey = *(cookie as *const DeliveryKey);

    // Unknown key: fall back to the engine's own resolution. Not expected
    // in correct operation.
    let Some(cell) = registry::lookup(key) else {
        return ptr::null_mut();
    };

    debug!(path = %requested, parent = %parent, "import request");

    // Take the resolver out of the context for the duration of the call.
    // The lock must not be held while the resolver runs: the resolver
    // calls back into the intake, which takes the same lock, and may
    // start independent compilations of its own.
    let (importer, timeout) = {
        let mut state = cell.state.lock();
        state.pending.requested = Some(requested.clone());
        state.pending.delivered = false;
        if let Some(stale) = state.pending.list.take() {
            sable_delete_import_list(stale);
        }
        (state.importer.take(), state.import_timeout)
    };

    let Some(mut importer) = importer else {
        return ptr::null_mut();
    };

    let request = ImportRequest {
        path: requested,
        parent,
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        importer(&request, DeliveryToken { key });
    }));

    let mut state = cell.state.lock();
    state.importer = Some(importer);

    // A resolver fault is scoped to this compile: it becomes an import
    // entry carrying an error, which the engine reports as a compile
    // failure. Nothing crosses this frame unwinding.
    if let Err(panic) = outcome {
        let message = panic_message(panic);
        debug!(message = %message, "resolver panicked");
        if let Some(stale) = state.pending.list.take() {
            sable_delete_import_list(stale);
        }
        return error_list(&format!("error in importer callback: {message}"));
    }

    // Cross-thread delivery: the resolver may have handed its token to
    // another thread and returned. Wait for the intake's signal, bounded
    // by the configured timeout.
    if !state.pending.delivered {
        if let Some(timeout) = timeout {
            let deadline = Instant::now() + timeout;
            while !state.pending.delivered {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                if cell.delivered.wait_for(&mut state, deadline - now).timed_out() {
                    break;
                }
            }
            if !state.pending.delivered {
                debug!("import resolution timed out");
                return error_list("import resolution timed out");
            }
        }
    }

    match state.pending.list.take() {
        // ownership of the list transfers to the engine here
        Some(list) => list,
        None => ptr::null_mut(),
    }
}

unsafe fn copy_path(path: *const c_char) -> String {
    if path.is_null() {
        String::new()
    } else {
        CStr::from_ptr(path).to_string_lossy().into_owned()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Build a one-entry import list carrying an error message.
fn error_list(message: &str) -> *mut SableImportList {
    unsafe {
        let list = sable_make_import_list(1);
        let entry = sable_make_import_entry(ptr::null_mut(), ptr::null_mut(), ptr::null_mut());
        sable_import_set_error(entry, TransferBuffer::from_str_lossy(message).into_raw());
        sable_import_list_set(list, 0, entry);
        list
    }
}
