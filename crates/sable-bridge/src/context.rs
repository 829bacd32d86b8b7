//! Per-compilation state.

use std::os::raw::c_void;
use std::ptr;
use std::time::Duration;

use sable_ffi::{
    sable_compile_data_context, sable_compile_file_context, sable_data_context_get_context,
    sable_delete_data_context, sable_delete_file_context, sable_delete_import_list,
    sable_file_context_get_context, SableContext, SableDataContext, SableFileContext,
    SableImportList,
};

use crate::registry::DeliveryKey;
use crate::ImporterCallback;

/// The engine context handle. Exactly one variant is live per
/// compilation, and it is destroyed exactly once, after result
/// extraction.
#[derive(Clone, Copy)]
pub(crate) enum EngineHandle {
    Data(*mut SableDataContext),
    File(*mut SableFileContext),
}

impl EngineHandle {
    pub(crate) fn context(&self) -> *mut SableContext {
        unsafe {
            match self {
                EngineHandle::Data(handle) => sable_data_context_get_context(*handle),
                EngineHandle::File(handle) => sable_file_context_get_context(*handle),
            }
        }
    }

    pub(crate) fn compile(&self) -> i32 {
        unsafe {
            match self {
                EngineHandle::Data(handle) => sable_compile_data_context(*handle),
                EngineHandle::File(handle) => sable_compile_file_context(*handle),
            }
        }
    }

    fn delete(self) {
        unsafe {
            match self {
                EngineHandle::Data(handle) => sable_delete_data_context(handle),
                EngineHandle::File(handle) => sable_delete_file_context(handle),
            }
        }
    }
}

/// State of the one import request that may be in flight for a
/// compilation. The engine issues requests serially, so a single pending
/// record suffices.
pub(crate) struct PendingImport {
    /// Path the engine asked for, kept for the default reply
    pub(crate) requested: Option<String>,
    /// Import list deposited by the intake, consumed by the trampoline
    pub(crate) list: Option<*mut SableImportList>,
    /// Whether the intake has run for the current request
    pub(crate) delivered: bool,
}

impl PendingImport {
    fn new() -> Self {
        Self {
            requested: None,
            list: None,
            delivered: false,
        }
    }
}

/// Everything owned by one compilation: the engine handle, the host
/// callbacks, and the pending import state the trampoline and intake
/// exchange.
pub(crate) struct CompilationContext {
    engine: Option<EngineHandle>,
    pub(crate) importer: Option<ImporterCallback>,
    pub(crate) import_timeout: Option<Duration>,
    pub(crate) pending: PendingImport,
    /// Key box registered with the engine as the importer cookie
    cookie: *mut DeliveryKey,
}

impl CompilationContext {
    pub(crate) fn new(engine: EngineHandle) -> Self {
        Self {
            engine: Some(engine),
            importer: None,
            import_timeout: None,
            pending: PendingImport::new(),
            cookie: ptr::null_mut(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_for_tests() -> Self {
        Self {
            engine: None,
            importer: None,
            import_timeout: None,
            pending: PendingImport::new(),
            cookie: ptr::null_mut(),
        }
    }

    /// Box the delivery key and remember the allocation; the returned
    /// pointer is what the engine passes back to the trampoline.
    pub(crate) fn install_cookie(&mut self, key: DeliveryKey) -> *mut c_void {
        debug_assert!(self.cookie.is_null());
        let cookie = Box::into_raw(Box::new(key));
        self.cookie = cookie;
        cookie as *mut c_void
    }
}

impl Drop for CompilationContext {
    fn drop(&mut self) {
        // a list delivered after the trampoline stopped waiting would
        // otherwise leak
        if let Some(list) = self.pending.list.take() {
            unsafe { sable_delete_import_list(list) };
        }
        if let Some(engine) = self.engine.take() {
            engine.delete();
        }
        if !self.cookie.is_null() {
            unsafe { drop(Box::from_raw(self.cookie)) };
            self.cookie = ptr::null_mut();
        }
    }
}

// The engine handle is only used from the thread driving the compile, and
// the pending list pointer only moves under the cell's lock. The raw
// pointers themselves carry no thread affinity.
unsafe impl Send for CompilationContext {}
