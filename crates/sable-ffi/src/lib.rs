//! C-compatible surface for the Sable compiler engine.
//!
//! This crate exposes the engine to embedders through a plain C API.
//! The API follows these principles:
//! - ABI-stable (uses only C-compatible types)
//! - Opaque pointers for engine objects
//! - Manual memory management with explicit ownership transfer
//! - Error reporting through status codes and owned result buffers
//!
//! Ownership contracts, in brief: every `*mut c_char` passed INTO a
//! `sable_*` function transfers ownership of that buffer to the engine.
//! Every pointer returned by a `sable_context_get_*` function is owned by
//! the context and stays valid until the context is deleted. Import lists
//! returned from an importer callback are consumed (and freed) by the
//! engine.

use sable_core::{CompileResult, Engine, ImportEntry, Options, Output};

pub use sable_core::OutputStyle;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

// ============================================================================
// Opaque Types
// ============================================================================

/// Opaque handle to a compilation context fed from a source string
#[repr(C)]
pub struct SableDataContext {
    _private: [u8; 0],
}

/// Opaque handle to a compilation context fed from a file path
#[repr(C)]
pub struct SableFileContext {
    _private: [u8; 0],
}

/// Opaque handle to the common context shared by both variants
#[repr(C)]
pub struct SableContext {
    _private: [u8; 0],
}

/// Opaque handle to a context's option block
#[repr(C)]
pub struct SableOptions {
    _private: [u8; 0],
}

/// Opaque handle to a single import resolution entry
#[repr(C)]
pub struct SableImport {
    _private: [u8; 0],
}

/// Opaque handle to a list of import resolution entries
#[repr(C)]
pub struct SableImportList {
    _private: [u8; 0],
}

/// Importer callback registered via `sable_option_set_importer`.
///
/// Invoked synchronously once per non-css `@import` with the requested
/// path, the path of the importing file, and the cookie supplied at
/// registration. The path pointers are only valid for the duration of the
/// call. Returning NULL tells the engine to resolve the import itself;
/// a returned list transfers ownership to the engine.
pub type SableImporterFn = unsafe extern "C" fn(
    path: *const c_char,
    parent: *const c_char,
    cookie: *mut c_void,
) -> *mut SableImportList;

// ============================================================================
// Internal Handles
// ============================================================================

enum SourceKind {
    Data(String),
    File(String),
}

struct OptionsHandle {
    input_path: String,
    output_path: String,
    asset_path: String,
    style: c_int,
    indented_syntax: bool,
    source_comments: bool,
    omit_source_map_url: bool,
    source_map_embed: bool,
    source_map_contents: bool,
    source_map_file: Option<String>,
    include_path: String,
    precision: c_int,
    importer: Option<(SableImporterFn, *mut c_void)>,
}

impl Default for OptionsHandle {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            output_path: String::new(),
            asset_path: String::new(),
            style: 0,
            indented_syntax: false,
            source_comments: false,
            omit_source_map_url: false,
            source_map_embed: false,
            source_map_contents: false,
            source_map_file: None,
            include_path: String::new(),
            precision: 5,
            importer: None,
        }
    }
}

impl OptionsHandle {
    fn to_core(&self, source: &SourceKind) -> Options {
        let input_path = if !self.input_path.is_empty() {
            self.input_path.clone()
        } else if let SourceKind::File(path) = source {
            path.clone()
        } else {
            String::new()
        };
        Options {
            input_path,
            output_path: self.output_path.clone(),
            asset_path: self.asset_path.clone(),
            style: OutputStyle::from_i32(self.style),
            indented_syntax: self.indented_syntax,
            source_comments: self.source_comments,
            omit_source_map_url: self.omit_source_map_url,
            source_map_embed: self.source_map_embed,
            source_map_contents: self.source_map_contents,
            source_map_file: self.source_map_file.clone(),
            include_paths: std::env::split_paths(&self.include_path).collect(),
            precision: self.precision.max(0) as u32,
        }
    }
}

struct ContextHandle {
    source: SourceKind,
    options: OptionsHandle,
    output: Option<CString>,
    error_json: Option<CString>,
    error_message: Option<CString>,
    error_status: c_int,
    included: Vec<CString>,
    included_ptrs: Vec<*const c_char>,
    source_map: Option<CString>,
}

impl ContextHandle {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            options: OptionsHandle::default(),
            output: None,
            error_json: None,
            error_message: None,
            error_status: 0,
            included: Vec::new(),
            included_ptrs: Vec::new(),
            source_map: None,
        }
    }

    fn store(&mut self, result: CompileResult<Output>) {
        match result {
            Ok(out) => {
                self.error_status = 0;
                self.output = Some(to_cstring(&out.css));
                self.included = out.included_files.iter().map(|f| to_cstring(f)).collect();
                self.included_ptrs = self
                    .included
                    .iter()
                    .map(|c| c.as_ptr())
                    .chain(std::iter::once(ptr::null()))
                    .collect();
                self.source_map = out.source_map.as_deref().map(to_cstring);
            }
            Err(err) => {
                self.error_status = err.status;
                self.error_json = Some(to_cstring(&err.to_json()));
                self.error_message = Some(to_cstring(&err.message));
            }
        }
    }
}

struct ImportHandle {
    path: Option<String>,
    contents: Option<String>,
    source_map: Option<String>,
    error: Option<String>,
}

struct ImportListHandle {
    entries: Vec<*mut SableImport>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Take ownership of a caller-allocated buffer; NULL yields None.
unsafe fn take_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CString::from_raw(ptr).to_string_lossy().into_owned())
}

/// Copy a Rust string into an owned C buffer, dropping interior NULs.
fn to_cstring(s: &str) -> CString {
    CString::new(s).unwrap_or_else(|_| {
        let cleaned: String = s.chars().filter(|c| *c != '\0').collect();
        CString::new(cleaned).unwrap_or_default()
    })
}

unsafe fn options_mut<'a>(options: *mut SableOptions) -> Option<&'a mut OptionsHandle> {
    if options.is_null() {
        None
    } else {
        Some(&mut *(options as *mut OptionsHandle))
    }
}

// ============================================================================
// Context Lifecycle
// ============================================================================

/// Create a compilation context over a source string.
///
/// # Safety
/// `source` must be a valid NUL-terminated buffer allocated by the caller;
/// ownership transfers to the context. NULL is treated as an empty source.
/// The returned context must be freed with `sable_delete_data_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_make_data_context(source: *mut c_char) -> *mut SableDataContext {
    let source = take_string(source).unwrap_or_default();
    Box::into_raw(Box::new(ContextHandle::new(SourceKind::Data(source)))) as *mut SableDataContext
}

/// Create a compilation context over a file path.
///
/// # Safety
/// `path` must be a valid NUL-terminated buffer allocated by the caller;
/// ownership transfers to the context. The returned context must be freed
/// with `sable_delete_file_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_make_file_context(path: *mut c_char) -> *mut SableFileContext {
    let path = take_string(path).unwrap_or_default();
    Box::into_raw(Box::new(ContextHandle::new(SourceKind::File(path)))) as *mut SableFileContext
}

/// Get the common context of a data context.
///
/// # Safety
/// `ctx` must be a live pointer from `sable_make_data_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_data_context_get_context(
    ctx: *mut SableDataContext,
) -> *mut SableContext {
    ctx as *mut SableContext
}

/// Get the common context of a file context.
///
/// # Safety
/// `ctx` must be a live pointer from `sable_make_file_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_file_context_get_context(
    ctx: *mut SableFileContext,
) -> *mut SableContext {
    ctx as *mut SableContext
}

/// Get the option block of a context. The returned pointer is owned by the
/// context and must not outlive it.
///
/// # Safety
/// `ctx` must be a live context pointer (or NULL, which yields NULL).
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_options(ctx: *mut SableContext) -> *mut SableOptions {
    if ctx.is_null() {
        return ptr::null_mut();
    }
    let handle = &mut *(ctx as *mut ContextHandle);
    &mut handle.options as *mut OptionsHandle as *mut SableOptions
}

/// Destroy a data context and everything it owns.
///
/// # Safety
/// `ctx` must be NULL or a pointer from `sable_make_data_context` that has
/// not been freed before. No pointer previously returned by a getter on
/// this context may be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn sable_delete_data_context(ctx: *mut SableDataContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx as *mut ContextHandle));
    }
}

/// Destroy a file context and everything it owns.
///
/// # Safety
/// Same contract as `sable_delete_data_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_delete_file_context(ctx: *mut SableFileContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx as *mut ContextHandle));
    }
}

// ============================================================================
// Option Setters
// ============================================================================
//
// All string setters take ownership of the passed buffer; NULL clears the
// option. Boolean options use 0 / non-zero.

/// # Safety
/// `options` must come from `sable_context_get_options`; `path` transfers
/// ownership.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_input_path(options: *mut SableOptions, path: *mut c_char) {
    if let Some(opts) = options_mut(options) {
        opts.input_path = take_string(path).unwrap_or_default();
    } else {
        drop(take_string(path));
    }
}

/// # Safety
/// Same contract as `sable_option_set_input_path`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_output_path(
    options: *mut SableOptions,
    path: *mut c_char,
) {
    if let Some(opts) = options_mut(options) {
        opts.output_path = take_string(path).unwrap_or_default();
    } else {
        drop(take_string(path));
    }
}

/// # Safety
/// Same contract as `sable_option_set_input_path`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_asset_path(
    options: *mut SableOptions,
    path: *mut c_char,
) {
    if let Some(opts) = options_mut(options) {
        opts.asset_path = take_string(path).unwrap_or_default();
    } else {
        drop(take_string(path));
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_output_style(options: *mut SableOptions, style: c_int) {
    if let Some(opts) = options_mut(options) {
        opts.style = style;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_is_indented_syntax(
    options: *mut SableOptions,
    value: c_int,
) {
    if let Some(opts) = options_mut(options) {
        opts.indented_syntax = value != 0;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_source_comments(
    options: *mut SableOptions,
    value: c_int,
) {
    if let Some(opts) = options_mut(options) {
        opts.source_comments = value != 0;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_omit_source_map_url(
    options: *mut SableOptions,
    value: c_int,
) {
    if let Some(opts) = options_mut(options) {
        opts.omit_source_map_url = value != 0;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_source_map_embed(
    options: *mut SableOptions,
    value: c_int,
) {
    if let Some(opts) = options_mut(options) {
        opts.source_map_embed = value != 0;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_source_map_contents(
    options: *mut SableOptions,
    value: c_int,
) {
    if let Some(opts) = options_mut(options) {
        opts.source_map_contents = value != 0;
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`; `path` transfers
/// ownership. An empty or NULL path disables source map output.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_source_map_file(
    options: *mut SableOptions,
    path: *mut c_char,
) {
    if let Some(opts) = options_mut(options) {
        opts.source_map_file = take_string(path).filter(|p| !p.is_empty());
    } else {
        drop(take_string(path));
    }
}

/// Set the include path list, joined with the platform's PATH separator.
///
/// # Safety
/// `options` must come from `sable_context_get_options`; `path` transfers
/// ownership.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_include_path(
    options: *mut SableOptions,
    path: *mut c_char,
) {
    if let Some(opts) = options_mut(options) {
        opts.include_path = take_string(path).unwrap_or_default();
    } else {
        drop(take_string(path));
    }
}

/// # Safety
/// `options` must come from `sable_context_get_options`.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_precision(options: *mut SableOptions, precision: c_int) {
    if let Some(opts) = options_mut(options) {
        opts.precision = precision;
    }
}

/// Register an importer callback. The engine will invoke it once per
/// non-css `@import` encountered during compilation, passing `cookie`
/// through untouched. Passing NULL unregisters.
///
/// # Safety
/// `options` must come from `sable_context_get_options`. `importer`, if
/// present, must remain callable for the lifetime of the context, and
/// `cookie` must stay valid for every invocation.
#[no_mangle]
pub unsafe extern "C" fn sable_option_set_importer(
    options: *mut SableOptions,
    importer: Option<SableImporterFn>,
    cookie: *mut c_void,
) {
    if let Some(opts) = options_mut(options) {
        opts.importer = importer.map(|f| (f, cookie));
    }
}

// ============================================================================
// Import Lists
// ============================================================================

/// Allocate an import list with `length` empty slots. Slots left NULL are
/// skipped by the engine.
#[no_mangle]
pub extern "C" fn sable_make_import_list(length: usize) -> *mut SableImportList {
    Box::into_raw(Box::new(ImportListHandle {
        entries: vec![ptr::null_mut(); length],
    })) as *mut SableImportList
}

/// Place an entry into a list slot, taking ownership of the entry. An
/// occupied slot's previous entry is freed; an out-of-range index frees
/// the entry instead of leaking it.
///
/// # Safety
/// `list` must be NULL or a live pointer from `sable_make_import_list`;
/// `entry` must be NULL or a live pointer from `sable_make_import_entry`
/// not already owned by a list.
#[no_mangle]
pub unsafe extern "C" fn sable_import_list_set(
    list: *mut SableImportList,
    index: usize,
    entry: *mut SableImport,
) {
    let Some(list) = (!list.is_null()).then(|| &mut *(list as *mut ImportListHandle)) else {
        if !entry.is_null() {
            drop(Box::from_raw(entry as *mut ImportHandle));
        }
        return;
    };
    match list.entries.get_mut(index) {
        Some(slot) => {
            if !slot.is_null() {
                drop(Box::from_raw(*slot as *mut ImportHandle));
            }
            *slot = entry;
        }
        None => {
            if !entry.is_null() {
                drop(Box::from_raw(entry as *mut ImportHandle));
            }
        }
    }
}

/// Create an import entry. All three buffers transfer ownership and may be
/// NULL. An empty `path` means "the originally requested path"; NULL
/// `contents` means "resolve `path` from disk".
///
/// # Safety
/// Each non-NULL argument must be a valid NUL-terminated caller-allocated
/// buffer, not used again by the caller afterwards.
#[no_mangle]
pub unsafe extern "C" fn sable_make_import_entry(
    path: *mut c_char,
    contents: *mut c_char,
    source_map: *mut c_char,
) -> *mut SableImport {
    Box::into_raw(Box::new(ImportHandle {
        path: take_string(path),
        contents: take_string(contents),
        source_map: take_string(source_map),
        error: None,
    })) as *mut SableImport
}

/// Mark an entry as failed. The engine aborts the compilation at the
/// importing location with this message.
///
/// # Safety
/// `entry` must be NULL or a live entry pointer; `message` transfers
/// ownership.
#[no_mangle]
pub unsafe extern "C" fn sable_import_set_error(entry: *mut SableImport, message: *mut c_char) {
    if entry.is_null() {
        drop(take_string(message));
        return;
    }
    (*(entry as *mut ImportHandle)).error = take_string(message);
}

/// Free an import list that was never handed to the engine, including all
/// entries and their buffers.
///
/// # Safety
/// `list` must be NULL or a live pointer from `sable_make_import_list`
/// whose ownership was not transferred to the engine.
#[no_mangle]
pub unsafe extern "C" fn sable_delete_import_list(list: *mut SableImportList) {
    if list.is_null() {
        return;
    }
    let list = Box::from_raw(list as *mut ImportListHandle);
    for entry in list.entries {
        if !entry.is_null() {
            drop(Box::from_raw(entry as *mut ImportHandle));
        }
    }
}

// ============================================================================
// Compilation
// ============================================================================

unsafe fn call_importer(
    importer: SableImporterFn,
    cookie: *mut c_void,
    specifier: &str,
    parent: &str,
) -> Option<Vec<ImportEntry>> {
    // The path buffers live only for the duration of the call; callbacks
    // must copy what they need.
    let c_spec = to_cstring(specifier);
    let c_parent = to_cstring(parent);
    let list = importer(c_spec.as_ptr(), c_parent.as_ptr(), cookie);
    if list.is_null() {
        return None;
    }
    let list = Box::from_raw(list as *mut ImportListHandle);
    let mut entries = Vec::with_capacity(list.entries.len());
    for entry in &list.entries {
        if entry.is_null() {
            continue;
        }
        let entry = Box::from_raw(*entry as *mut ImportHandle);
        entries.push(ImportEntry {
            path: entry.path,
            contents: entry.contents,
            source_map: entry.source_map,
            error: entry.error,
        });
    }
    Some(entries)
}

unsafe fn compile_context(ctx: *mut SableContext) -> c_int {
    if ctx.is_null() {
        return 1;
    }
    let handle = &mut *(ctx as *mut ContextHandle);
    let options = handle.options.to_core(&handle.source);
    let importer = handle.options.importer;

    let result = match importer {
        Some((callback, cookie)) => {
            let mut hook =
                move |spec: &str, parent: &str| call_importer(callback, cookie, spec, parent);
            let mut engine = Engine::with_importer(&options, &mut hook);
            match &handle.source {
                SourceKind::Data(source) => engine.compile_data(source),
                SourceKind::File(path) => engine.compile_file(path),
            }
        }
        None => {
            let mut engine = Engine::new(&options);
            match &handle.source {
                SourceKind::Data(source) => engine.compile_data(source),
                SourceKind::File(path) => engine.compile_file(path),
            }
        }
    };

    handle.store(result);
    handle.error_status
}

/// Compile a data context. Returns the error status (0 on success).
///
/// # Safety
/// `ctx` must be NULL or a live pointer from `sable_make_data_context`.
/// Any importer registered on the context's options must be safe to call
/// on the current thread.
#[no_mangle]
pub unsafe extern "C" fn sable_compile_data_context(ctx: *mut SableDataContext) -> c_int {
    compile_context(ctx as *mut SableContext)
}

/// Compile a file context. Returns the error status (0 on success).
///
/// # Safety
/// Same contract as `sable_compile_data_context`.
#[no_mangle]
pub unsafe extern "C" fn sable_compile_file_context(ctx: *mut SableFileContext) -> c_int {
    compile_context(ctx as *mut SableContext)
}

// ============================================================================
// Result Getters
// ============================================================================

unsafe fn context_ref<'a>(ctx: *mut SableContext) -> Option<&'a ContextHandle> {
    if ctx.is_null() {
        None
    } else {
        Some(&*(ctx as *const ContextHandle))
    }
}

/// Compiled css text; NULL before compilation or after a failure.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer. The returned pointer is
/// owned by the context.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_output_string(ctx: *mut SableContext) -> *const c_char {
    context_ref(ctx)
        .and_then(|h| h.output.as_ref())
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

/// Error status of the last compilation; 0 means success.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_error_status(ctx: *mut SableContext) -> c_int {
    context_ref(ctx).map(|h| h.error_status).unwrap_or(1)
}

/// Structured JSON error payload; NULL unless the last compilation failed.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer. The returned pointer is
/// owned by the context.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_error_json(ctx: *mut SableContext) -> *const c_char {
    context_ref(ctx)
        .and_then(|h| h.error_json.as_ref())
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

/// Plain error message; NULL unless the last compilation failed.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer. The returned pointer is
/// owned by the context.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_error_message(ctx: *mut SableContext) -> *const c_char {
    context_ref(ctx)
        .and_then(|h| h.error_message.as_ref())
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

/// NULL-terminated array of files pulled in through imports, in
/// resolution order; NULL before a successful compilation.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer. The returned array and
/// its strings are owned by the context.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_included_files(
    ctx: *mut SableContext,
) -> *const *const c_char {
    context_ref(ctx)
        .filter(|h| !h.included_ptrs.is_empty())
        .map(|h| h.included_ptrs.as_ptr())
        .unwrap_or(ptr::null())
}

/// Source map JSON; NULL when none was requested or compilation failed.
///
/// # Safety
/// `ctx` must be NULL or a live context pointer. The returned pointer is
/// owned by the context.
#[no_mangle]
pub unsafe extern "C" fn sable_context_get_source_map_string(
    ctx: *mut SableContext,
) -> *const c_char {
    context_ref(ctx)
        .and_then(|h| h.source_map.as_ref())
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn c_string(s: &str) -> *mut c_char {
        CString::new(s).unwrap().into_raw()
    }

    unsafe fn read_c_str(ptr: *const c_char) -> String {
        assert!(!ptr.is_null());
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }

    #[test]
    fn test_compile_through_c_surface() {
        unsafe {
            let dctx = sable_make_data_context(c_string("a{b:1}"));
            let ctx = sable_data_context_get_context(dctx);
            let options = sable_context_get_options(ctx);
            sable_option_set_output_style(options, 1);

            let status = sable_compile_data_context(dctx);
            assert_eq!(status, 0);
            assert_eq!(sable_context_get_error_status(ctx), 0);
            let css = read_c_str(sable_context_get_output_string(ctx));
            assert!(css.contains("b: 1;"));
            assert!(sable_context_get_error_json(ctx).is_null());

            sable_delete_data_context(dctx);
        }
    }

    #[test]
    fn test_error_surface() {
        unsafe {
            let dctx = sable_make_data_context(c_string("a{"));
            let ctx = sable_data_context_get_context(dctx);

            let status = sable_compile_data_context(dctx);
            assert_eq!(status, 1);
            assert!(sable_context_get_output_string(ctx).is_null());
            let json = read_c_str(sable_context_get_error_json(ctx));
            assert!(json.contains("\"line\":1"));
            let message = read_c_str(sable_context_get_error_message(ctx));
            assert!(!message.is_empty());

            sable_delete_data_context(dctx);
        }
    }

    unsafe extern "C" fn literal_importer(
        path: *const c_char,
        _parent: *const c_char,
        _cookie: *mut c_void,
    ) -> *mut SableImportList {
        let requested = CStr::from_ptr(path).to_string_lossy().into_owned();
        let list = sable_make_import_list(1);
        let entry = sable_make_import_entry(
            c_string(&requested),
            c_string("x{y:1}"),
            ptr::null_mut(),
        );
        sable_import_list_set(list, 0, entry);
        list
    }

    #[test]
    fn test_importer_callback_supplies_virtual_file() {
        unsafe {
            let dctx = sable_make_data_context(c_string("@import \"lib\";"));
            let ctx = sable_data_context_get_context(dctx);
            let options = sable_context_get_options(ctx);
            sable_option_set_importer(options, Some(literal_importer), ptr::null_mut());

            assert_eq!(sable_compile_data_context(dctx), 0);
            let css = read_c_str(sable_context_get_output_string(ctx));
            assert!(css.contains("y: 1;"));

            let files = sable_context_get_included_files(ctx);
            assert!(!files.is_null());
            assert_eq!(read_c_str(*files), "lib");
            assert!((*files.add(1)).is_null());

            sable_delete_data_context(dctx);
        }
    }

    unsafe extern "C" fn sparse_importer(
        _path: *const c_char,
        _parent: *const c_char,
        _cookie: *mut c_void,
    ) -> *mut SableImportList {
        // slot 0 left NULL on purpose; the engine must skip it
        let list = sable_make_import_list(2);
        let entry = sable_make_import_entry(c_string("only"), c_string("q{r:2}"), ptr::null_mut());
        sable_import_list_set(list, 1, entry);
        list
    }

    #[test]
    fn test_null_slots_are_skipped() {
        unsafe {
            let dctx = sable_make_data_context(c_string("@import \"lib\";"));
            let ctx = sable_data_context_get_context(dctx);
            let options = sable_context_get_options(ctx);
            sable_option_set_importer(options, Some(sparse_importer), ptr::null_mut());

            assert_eq!(sable_compile_data_context(dctx), 0);
            let css = read_c_str(sable_context_get_output_string(ctx));
            assert!(css.contains("r: 2;"));

            sable_delete_data_context(dctx);
        }
    }

    unsafe extern "C" fn failing_importer(
        _path: *const c_char,
        _parent: *const c_char,
        _cookie: *mut c_void,
    ) -> *mut SableImportList {
        let list = sable_make_import_list(1);
        let entry = sable_make_import_entry(ptr::null_mut(), ptr::null_mut(), ptr::null_mut());
        sable_import_set_error(entry, c_string("resolver exploded"));
        sable_import_list_set(list, 0, entry);
        list
    }

    #[test]
    fn test_importer_error_entry_fails_compile() {
        unsafe {
            let dctx = sable_make_data_context(c_string("@import \"lib\";"));
            let ctx = sable_data_context_get_context(dctx);
            let options = sable_context_get_options(ctx);
            sable_option_set_importer(options, Some(failing_importer), ptr::null_mut());

            assert_eq!(sable_compile_data_context(dctx), 1);
            let message = read_c_str(sable_context_get_error_message(ctx));
            assert!(message.contains("resolver exploded"));

            sable_delete_data_context(dctx);
        }
    }

    #[test]
    fn test_delete_unconsumed_import_list() {
        unsafe {
            let list = sable_make_import_list(2);
            let entry = sable_make_import_entry(c_string("a"), c_string("b"), ptr::null_mut());
            sable_import_list_set(list, 0, entry);
            // double-set frees the displaced entry
            let replacement = sable_make_import_entry(c_string("c"), ptr::null_mut(), ptr::null_mut());
            sable_import_list_set(list, 0, replacement);
            // out-of-range set frees the orphan entry
            let orphan = sable_make_import_entry(c_string("d"), ptr::null_mut(), ptr::null_mut());
            sable_import_list_set(list, 9, orphan);
            sable_delete_import_list(list);
        }
    }

    #[test]
    fn test_file_context_missing_file() {
        unsafe {
            let fctx = sable_make_file_context(c_string("/no/such/entry.scss"));
            let ctx = sable_file_context_get_context(fctx);
            assert_eq!(sable_compile_file_context(fctx), 1);
            let message = read_c_str(sable_context_get_error_message(ctx));
            assert!(message.contains("not found or unreadable"));
            sable_delete_file_context(fctx);
        }
    }
}
