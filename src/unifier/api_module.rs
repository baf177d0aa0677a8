//! ApiModule expansion for Python code.
//!
//! `from FooApiModule import *` is replaced by the source of
//! `Packs/ApiModules/Scripts/FooApiModule/FooApiModule.py`, wrapped in a
//! generated-code banner. Modules importing other modules are expanded
//! recursively; each module is injected at most once per script.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::error::{PackError, Result, fs, unify};
use crate::loader::cache::OnceCache;

static API_MODULE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"from ([\w\d]+ApiModule) import \*(?:  # noqa: E402)?")
        .expect("ApiModule import regex")
});

/// Raw module sources keyed by module name, shared across workers
pub type ApiModuleCache = OnceCache<String, String>;

/// Where a module's source lives under the content root
pub fn module_path(content_root: &Path, module: &str) -> PathBuf {
    content_root
        .join("Packs")
        .join("ApiModules")
        .join("Scripts")
        .join(module)
        .join(format!("{module}.py"))
}

fn load_module(content_root: &Path, cache: &ApiModuleCache, module: &str) -> Result<Arc<String>> {
    let path = module_path(content_root, module);
    cache
        .get_or_init(&module.to_string(), || {
            debug!(module, path = %path.display(), "reading ApiModule");
            fs::read_to_string(&path).map_err(|e| e.to_string())
        })
        .map_err(|_| PackError::ApiModuleNotFound {
            module: module.to_string(),
            path: path.display().to_string(),
        })
}

fn banner(import_line: &str, module: &str, body: &str, indent: &str) -> String {
    let block = format!(
        "### GENERATED CODE ###: {import_line}\n\
         # This code was inserted in place of an API module.\n\
         register_module_line('{module}', 'start', __line__(), wrapper=-3)\n\
         {body}\n\
         register_module_line('{module}', 'end', __line__(), wrapper=1)\n\
         ### END GENERATED CODE ###"
    );
    if indent.is_empty() {
        return block;
    }
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Expander<'a> {
    content_root: &'a Path,
    cache: &'a ApiModuleCache,
    chain: Vec<String>,
    injected: BTreeSet<String>,
}

impl Expander<'_> {
    fn expand(&mut self, code: &str) -> Result<String> {
        if !API_MODULE_IMPORT.is_match(code) {
            return Ok(code.to_string());
        }
        let mut out: Vec<String> = Vec::new();
        for line in code.split('\n') {
            let Some(caps) = API_MODULE_IMPORT.captures(line) else {
                out.push(line.to_string());
                continue;
            };
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                out.push(line.to_string());
                continue;
            };
            let module = name.as_str().to_string();
            if self.chain.contains(&module) {
                return Err(unify::api_module_cycle(&self.chain, &module));
            }
            let indent = &line[..line.len() - line.trim_start().len()];
            let before = &line[indent.len()..whole.start()];
            let after = &line[whole.end()..];

            if !self.injected.insert(module.clone()) {
                // already inlined earlier in this script
                out.push(format!("{indent}{before}{after}").trim_end().to_string());
                continue;
            }
            let source = load_module(self.content_root, self.cache, &module)?;
            self.chain.push(module.clone());
            let body = self.expand(&source)?;
            self.chain.pop();

            out.push(String::new());
            out.push(format!(
                "{}{after}",
                banner(whole.as_str(), &module, &body, indent)
            ));
        }
        Ok(out.join("\n"))
    }
}

/// Replace ApiModule imports in `code` with the modules' sources.
///
/// `owner` names the script being unified and seeds the cycle chain so a
/// module importing itself through others is caught.
pub fn expand(
    code: &str,
    owner: &str,
    content_root: &Path,
    cache: &ApiModuleCache,
) -> Result<String> {
    let mut expander = Expander {
        content_root,
        cache,
        chain: vec![owner.to_string()],
        injected: BTreeSet::new(),
    };
    expander.expand(code)
}
