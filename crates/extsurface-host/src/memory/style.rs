//! In-memory style host.

use std::collections::HashSet;
use std::sync::Mutex;

use extsurface_core::sync::lock;
use indexmap::IndexMap;

use crate::bridge::{BoxFuture, StyleHost};
use crate::error::{HostError, HostResult};
use crate::types::{CompileOptions, CompiledStyle};

/// Style host that keeps injected stylesheets in a map.
///
/// Its `compile` is a small stand-in for a real preprocessor: it substitutes
/// `$name` variables, checks brace balance and optionally collapses whitespace.
#[derive(Debug, Default)]
pub struct MemoryStyleHost {
    styles: Mutex<IndexMap<String, String>>,
    rejected: Mutex<HashSet<String>>,
}

impl MemoryStyleHost {
    /// Create an empty style host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injected styles in injection order.
    pub fn styles(&self) -> Vec<(String, String)> {
        lock(&self.styles)
            .iter()
            .map(|(id, css)| (id.clone(), css.clone()))
            .collect()
    }

    /// CSS injected under `style_id`.
    pub fn css(&self, style_id: &str) -> Option<String> {
        lock(&self.styles).get(style_id).cloned()
    }

    /// Make every inject or delete of `style_id` fail.
    pub fn reject(&self, style_id: impl Into<String>) {
        lock(&self.rejected).insert(style_id.into());
    }

    /// Stop rejecting `style_id`.
    pub fn accept(&self, style_id: &str) {
        lock(&self.rejected).remove(style_id);
    }

    fn check(&self, action: &str, style_id: &str) -> HostResult<()> {
        if lock(&self.rejected).contains(style_id) {
            return Err(HostError::rejected(
                format!("{action} of style '{style_id}'"),
                "style is locked",
            ));
        }
        Ok(())
    }
}

/// Substitute variables, validate braces and optionally minify.
fn compile_source(source: &str, options: &CompileOptions) -> HostResult<String> {
    let mut css = source.to_string();
    // Longest names first so `$accent-dark` is not clobbered by `$accent`.
    let mut variables: Vec<_> = options.variables.iter().collect();
    variables.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    for (name, value) in variables {
        css = css.replace(&format!("${name}"), value);
    }

    let mut depth: i64 = 0;
    for (line_no, line) in css.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(HostError::Compile {
                    message: format!("unexpected '}}' on line {}", line_no + 1),
                });
            }
        }
    }
    if depth != 0 {
        return Err(HostError::Compile {
            message: format!("{depth} unclosed block(s)"),
        });
    }
    if let Some(pos) = css.find('$') {
        let name: String = css[pos + 1..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        return Err(HostError::Compile {
            message: format!("undefined variable ${name}"),
        });
    }

    if options.minify {
        css = css.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    Ok(css.trim().to_string())
}

impl StyleHost for MemoryStyleHost {
    fn compile<'a>(
        &'a self,
        source: &'a str,
        options: &'a CompileOptions,
    ) -> BoxFuture<'a, HostResult<CompiledStyle>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let css = compile_source(source, options)?;
            Ok(CompiledStyle { css })
        })
    }

    fn inject_style(&self, css: &str, style_id: &str) -> HostResult<()> {
        self.check("injection", style_id)?;
        lock(&self.styles).insert(style_id.to_string(), css.to_string());
        tracing::trace!(target: "extsurface::host", style_id, "Style injected");
        Ok(())
    }

    fn delete_style(&self, style_id: &str) -> HostResult<()> {
        self.check("deletion", style_id)?;
        lock(&self.styles).shift_remove(style_id);
        Ok(())
    }
}
