//! Host-side binding for the Sable engine.
//!
//! The engine compiles stylesheets synchronously and, by itself, resolves
//! `@import`s from disk. This crate lets the host take over import
//! resolution: a resolver callback receives every import request
//! mid-compile, together with a single-use delivery token, and answers by
//! calling [`deliver_imports`] before the engine is allowed to continue.
//!
//! The moving parts, bottom up:
//! - [`TransferBuffer`]: owned NUL-terminated buffers for every string
//!   crossing the C boundary
//! - a process-wide registry correlating delivery tokens with live
//!   compilations (generation-checked, so stale tokens are detected)
//! - the import trampoline: the `extern "C"` callback the engine invokes,
//!   which runs the resolver and blocks until delivery
//! - [`deliver_imports`]: the intake that converts the resolver's reply
//!   into engine import entries and wakes the trampoline
//!
//! # Example
//!
//! ```ignore
//! use sable_bridge::{deliver_imports, render_sync, RenderOptions, RenderResult};
//! use serde_json::json;
//!
//! let mut result = RenderResult::default();
//! let options = RenderOptions {
//!     data: Some("@import \"theme\";".to_string()),
//!     importer: Some(Box::new(|request, token| {
//!         let reply = json!({ "file": request.path, "contents": "body { color: red }" });
//!         deliver_imports(&reply, token).expect("compilation is live");
//!     })),
//!     ..Default::default()
//! };
//! render_sync(options, &mut result)?;
//! ```

#![warn(rust_2018_idioms)]

mod buffer;
mod context;
mod error;
mod intake;
mod marshal;
mod registry;
mod trampoline;

pub use buffer::TransferBuffer;
pub use error::{CompileFailure, DeliveryError, RenderError};
pub use intake::deliver_imports;
pub use sable_ffi::OutputStyle;

use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

use context::{CompilationContext, EngineHandle};
use registry::{ContextCell, DeliveryKey};
use sable_ffi::{sable_make_data_context, sable_make_file_context};

/// One import request, as seen by the resolver.
///
/// Both paths are copies owned by the host; nothing here aliases engine
/// memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// The path being imported
    pub path: String,
    /// The file the import appears in
    pub parent: String,
}

/// Single-use token tying an import request to its compilation.
///
/// The token is deliberately neither `Clone` nor `Copy`: it is consumed
/// by [`deliver_imports`], so a reply cannot be delivered twice, and a
/// token that outlives its compilation is rejected rather than silently
/// matched to a newer one.
#[derive(Debug)]
pub struct DeliveryToken {
    pub(crate) key: DeliveryKey,
}

/// Resolver invoked once per `@import` encountered during compilation.
pub type ImporterCallback = Box<dyn FnMut(&ImportRequest, DeliveryToken) + Send>;

/// Completion callback for [`render`], invoked with the populated result.
pub type SuccessCallback = Box<dyn FnOnce(RenderResult) + Send>;

/// Failure callback for [`render`].
pub type ErrorCallback = Box<dyn FnOnce(RenderError) + Send>;

/// Options for one compilation.
///
/// Scalar options are copied verbatim into the engine configuration;
/// semantic validity is the caller's responsibility. Only the presence of
/// a source (`data` or `file`) and of the completion callbacks (for
/// [`render`]) is validated eagerly.
pub struct RenderOptions {
    /// Compile this source string (takes precedence over `file`)
    pub data: Option<String>,
    /// Compile this file; with `data` set, only names the entry
    pub file: Option<String>,
    /// Destination path, used for source map references
    pub out_file: Option<String>,
    /// Prefix for relative `url(...)` values
    pub image_path: Option<String>,
    /// Output formatting style
    pub style: OutputStyle,
    /// Treat the input as indented syntax
    pub indented_syntax: bool,
    /// Emit source position comments before every rule
    pub comments: bool,
    /// Suppress the `sourceMappingURL` comment
    pub omit_source_map_url: bool,
    /// Inline the source map into the css
    pub source_map_embed: bool,
    /// Include source texts in the map
    pub source_map_contents: bool,
    /// Emit a source map destined for this path
    pub source_map: Option<String>,
    /// Directories searched for disk imports
    pub include_paths: Vec<String>,
    /// Decimal places kept on numeric values
    pub precision: i32,
    /// How long the trampoline waits for a cross-thread delivery after
    /// the resolver returns without delivering; `None` means don't wait
    pub import_timeout: Option<Duration>,
    /// Host import resolver
    pub importer: Option<ImporterCallback>,
    /// Completion callback (callback mode only)
    pub success: Option<SuccessCallback>,
    /// Failure callback (callback mode only)
    pub error: Option<ErrorCallback>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            data: None,
            file: None,
            out_file: None,
            image_path: None,
            style: OutputStyle::Nested,
            indented_syntax: false,
            comments: false,
            omit_source_map_url: false,
            source_map_embed: false,
            source_map_contents: false,
            source_map: None,
            include_paths: Vec::new(),
            precision: 5,
            import_timeout: None,
            importer: None,
            success: None,
            error: None,
        }
    }
}

/// Compilation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Entry file name, or `data` for string input
    pub entry: String,
    /// Files pulled in through imports, in engine-reported order
    pub included_files: Vec<String>,
}

/// Result sink populated by a successful compilation.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    /// Compiled css; untouched on failure
    pub css: Option<String>,
    pub stats: RenderStats,
    /// Source map JSON, `{}` when none was requested
    pub source_map: Option<String>,
}

fn validate(options: &RenderOptions) -> Result<(), RenderError> {
    if options.data.is_none() && options.file.is_none() {
        return Err(RenderError::Config(
            "either \"data\" or \"file\" must be supplied".to_string(),
        ));
    }
    if options.precision < 0 {
        return Err(RenderError::Config(
            "\"precision\" must be non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Compile synchronously on the calling thread, populating `result`.
///
/// Completion callbacks in `options` are ignored in this mode. When an
/// importer is configured, it runs nested inside this call for every
/// import the engine encounters.
pub fn render_sync(mut options: RenderOptions, result: &mut RenderResult) -> Result<(), RenderError> {
    // blocking mode has no use for completion callbacks
    options.success = None;
    options.error = None;
    run_compile(options, result)
}

/// Compile on a worker thread. Exactly one of the `success`/`error`
/// callbacks fires with the outcome; both are required. Configuration
/// problems are reported eagerly, before the thread spawns.
pub fn render(mut options: RenderOptions) -> Result<JoinHandle<()>, RenderError> {
    validate(&options)?;
    let Some(success) = options.success.take() else {
        return Err(RenderError::Config(
            "a \"success\" callback is required".to_string(),
        ));
    };
    let Some(error) = options.error.take() else {
        return Err(RenderError::Config(
            "an \"error\" callback is required".to_string(),
        ));
    };
    Ok(std::thread::spawn(move || {
        let mut result = RenderResult::default();
        match run_compile(options, &mut result) {
            Ok(()) => success(result),
            Err(failure) => error(failure),
        }
    }))
}

/// The shared compile pipeline: build the engine context, register the
/// compilation, configure, compile, extract, retire.
fn run_compile(mut options: RenderOptions, result: &mut RenderResult) -> Result<(), RenderError> {
    validate(&options)?;

    let (engine, entry) = if let Some(data) = options.data.take() {
        let source = TransferBuffer::from_str_lossy(&data);
        let handle = unsafe { sable_make_data_context(source.into_raw()) };
        let entry = options.file.clone().unwrap_or_else(|| "data".to_string());
        (EngineHandle::Data(handle), entry)
    } else {
        // validate() guarantees a file when data is absent
        let file = options.file.clone().unwrap_or_default();
        let path = TransferBuffer::from_str_lossy(&file);
        let handle = unsafe { sable_make_file_context(path.into_raw()) };
        (EngineHandle::File(handle), file)
    };

    let mut context = CompilationContext::new(engine);
    context.importer = options.importer.take();
    context.import_timeout = options.import_timeout;
    let has_importer = context.importer.is_some();

    let cell = ContextCell::new(context);
    let key = registry::register(cell.clone());
    let cookie = has_importer.then(|| cell.state.lock().install_cookie(key));

    marshal::configure(&engine, &options, cookie);

    // The engine runs nested on this thread; every import request
    // re-enters through the trampoline before this returns.
    let status = engine.compile();
    debug!(status, entry = %entry, "engine returned");

    let outcome = marshal::extract(result, &engine, &entry);

    // Retire before release: once the slot is gone, no token can reach
    // this compilation, so tearing down the engine context is safe.
    registry::retire(key);
    drop(cell);

    outcome
}
