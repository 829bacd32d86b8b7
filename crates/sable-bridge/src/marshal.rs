//! Option and result marshaling.
//!
//! Flat field copying between the host-side records and the engine's
//! option and result surfaces. Nothing here is order-sensitive; the
//! interesting lifetimes all live in the trampoline and the intake.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use sable_ffi::{
    sable_context_get_error_json, sable_context_get_error_status,
    sable_context_get_included_files, sable_context_get_options, sable_context_get_output_string,
    sable_context_get_source_map_string, sable_option_set_asset_path,
    sable_option_set_include_path, sable_option_set_input_path, sable_option_set_importer,
    sable_option_set_is_indented_syntax, sable_option_set_omit_source_map_url,
    sable_option_set_output_path, sable_option_set_output_style, sable_option_set_precision,
    sable_option_set_source_comments, sable_option_set_source_map_contents,
    sable_option_set_source_map_embed, sable_option_set_source_map_file,
};

use crate::buffer::TransferBuffer;
use crate::context::EngineHandle;
use crate::error::{CompileFailure, RenderError};
use crate::trampoline::import_trampoline;
use crate::{RenderOptions, RenderResult};

/// Copy every option verbatim into the engine configuration. No
/// validation happens here; the render entry points validate before the
/// engine context exists.
pub(crate) fn configure(
    engine: &EngineHandle,
    options: &RenderOptions,
    importer_cookie: Option<*mut c_void>,
) {
    unsafe {
        let ctx = engine.context();
        let opts = sable_context_get_options(ctx);

        sable_option_set_input_path(
            opts,
            TransferBuffer::from_opt(options.file.as_deref()).into_raw(),
        );
        sable_option_set_output_path(
            opts,
            TransferBuffer::from_opt(options.out_file.as_deref()).into_raw(),
        );
        sable_option_set_asset_path(
            opts,
            TransferBuffer::from_opt(options.image_path.as_deref()).into_raw(),
        );
        sable_option_set_output_style(opts, options.style as i32);
        sable_option_set_is_indented_syntax(opts, options.indented_syntax as i32);
        sable_option_set_source_comments(opts, options.comments as i32);
        sable_option_set_omit_source_map_url(opts, options.omit_source_map_url as i32);
        sable_option_set_source_map_embed(opts, options.source_map_embed as i32);
        sable_option_set_source_map_contents(opts, options.source_map_contents as i32);
        sable_option_set_source_map_file(
            opts,
            TransferBuffer::from_opt(options.source_map.as_deref()).into_raw(),
        );
        let separator = if cfg!(windows) { ";" } else { ":" };
        sable_option_set_include_path(
            opts,
            TransferBuffer::from_str_lossy(&options.include_paths.join(separator)).into_raw(),
        );
        sable_option_set_precision(opts, options.precision);

        if let Some(cookie) = importer_cookie {
            sable_option_set_importer(opts, Some(import_trampoline), cookie);
        }
    }
}

/// Copy the engine's results onto the host result sink. On failure only
/// the structured error is surfaced; css, stats, and source map stay
/// untouched.
pub(crate) fn extract(
    result: &mut RenderResult,
    engine: &EngineHandle,
    entry: &str,
) -> Result<(), RenderError> {
    unsafe {
        let ctx = engine.context();
        if sable_context_get_error_status(ctx) != 0 {
            let json = cstr_to_string(sable_context_get_error_json(ctx))
                .unwrap_or_else(|| r#"{"status":1,"message":"unknown compile failure"}"#.into());
            return Err(RenderError::Compile(CompileFailure::from_json(&json)));
        }

        result.css = cstr_to_string(sable_context_get_output_string(ctx));
        result.stats.entry = entry.to_string();
        result.stats.included_files.clear();
        let files = sable_context_get_included_files(ctx);
        if !files.is_null() {
            let mut index = 0;
            loop {
                let file = *files.add(index);
                if file.is_null() {
                    break;
                }
                if let Some(name) = cstr_to_string(file) {
                    result.stats.included_files.push(name);
                }
                index += 1;
            }
        }
        result.source_map = Some(
            cstr_to_string(sable_context_get_source_map_string(ctx))
                .unwrap_or_else(|| "{}".to_string()),
        );
        Ok(())
    }
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}
