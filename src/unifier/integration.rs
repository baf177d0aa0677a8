//! Integration and script unification

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use tracing::{debug, warn};

use super::{Unified, UnifyContext, api_module, contributors};
use crate::document::ScalarStyle;
use crate::domain::{ContentItem, ContentKind, SidecarKind, SupportLevel, Version};
use crate::error::{PackError, Result, fs, unify};
use crate::zipper::naming;

pub const IMAGE_PREFIX: &str = "data:image/png;base64,";
pub const INTEGRATION_DOCS_REFERENCE: &str = "https://xsoar.pan.dev/docs/reference/integrations/";
pub const PARTNER_FETCH_NOTICE: &str = "**This integration is supported by Palo Alto Networks.**\n***\n";
const DOC_LINK_LABEL: &str = "[View Integration Documentation]";
const DOCKER45_FROM_VERSION: Version = Version::new(5, 0, 0);
const DOCKER45_TO_VERSION: Version = Version::new(4, 5, 9);

static PYTHON_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(import demistomock as demisto|from CommonServerPython import \*|from CommonServerUserPython import \*|from __future__ import print_function)[ \t]*(#.*)?",
    )
    .expect("python boilerplate regex")
});
static CAMEL_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym regex"));
static CAMEL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("camel regex"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w-]").expect("non-word regex"));

/// Runtime language of a script body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Python,
    JavaScript,
    PowerShell,
}

impl ScriptType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "python" | "python2" | "python3" => Some(Self::Python),
            "javascript" => Some(Self::JavaScript),
            "powershell" => Some(Self::PowerShell),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::JavaScript => "js",
            Self::PowerShell => "ps1",
        }
    }
}

/// Dotted paths of the script fields; scripts keep them at the root
struct ScriptFields {
    code: &'static str,
    kind: &'static str,
    docker: &'static str,
    docker45: &'static str,
}

fn script_fields(kind: ContentKind) -> ScriptFields {
    if kind == ContentKind::Script {
        ScriptFields {
            code: "script",
            kind: "type",
            docker: "dockerimage",
            docker45: "dockerimage45",
        }
    } else {
        ScriptFields {
            code: "script.script",
            kind: "script.type",
            docker: "script.dockerimage",
            docker45: "script.dockerimage45",
        }
    }
}

/// Strip the runtime imports the server provides itself
pub fn clean_python_code(code: &str) -> String {
    PYTHON_BOILERPLATE.replace_all(code, "").into_owned()
}

pub fn clean_powershell_code(code: &str) -> String {
    code.replace(". $PSScriptRoot\\demistomock.ps1", "")
        .replace(". $PSScriptRoot\\CommonServerPowerShell.ps1", "")
}

/// Prepend a `pack version` comment unless one is present
pub fn stamp_pack_version(script_type: ScriptType, code: &str, version: Version) -> String {
    let marker = match script_type {
        ScriptType::JavaScript => "// pack version:",
        ScriptType::Python | ScriptType::PowerShell => "### pack version:",
    };
    if code.contains(marker) {
        code.to_string()
    } else {
        format!("{marker} {version}\n{code}")
    }
}

/// Wrap Python code in `register_module_line` start/end markers
pub fn register_module_lines(name: &str, code: &str) -> String {
    format!(
        "register_module_line('{name}', 'start', __line__())\n{code}\nregister_module_line('{name}', 'end', __line__())\n"
    )
}

/// Documentation slug: `Cortex XDR - IOC` is `cortex-xdr---ioc`, `SomeIntegration` is `some-integration`
pub fn normalize_integration_id(id: &str) -> String {
    let underscored = CAMEL_ACRONYM.replace_all(id, "${1}_${2}");
    let underscored = CAMEL_WORD.replace_all(&underscored, "${1}_${2}");
    let dashed = underscored
        .replace('-', "_")
        .to_lowercase()
        .replace('_', "-")
        .replace(' ', "-");
    NON_WORD.replace_all(&dashed, "").into_owned()
}

fn read_code(item: &ContentItem, script_type: ScriptType) -> Result<String> {
    let path = item
        .sidecars
        .get(&SidecarKind::Code)
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(script_type.extension()))
        .ok_or_else(|| {
            unify::missing_sidecar(item.id.clone(), format!("code (.{})", script_type.extension()))
        })?;
    fs::read_to_string(path)
}

fn inline_code(ctx: &UnifyContext<'_>, item: &mut ContentItem, fields: &ScriptFields) -> Result<()> {
    let type_name = item.body.get_str(fields.kind).unwrap_or_default().to_string();
    let script_type =
        ScriptType::parse(&type_name).ok_or_else(|| PackError::UnsupportedScriptType {
            item: item.id.clone(),
            script_type: type_name.clone(),
        })?;

    let existing = item.body.get_str(fields.code).unwrap_or_default().trim();
    if !existing.is_empty() && existing != "-" {
        warn!(item = %item.id, "script field is not empty, replacing it with the code file");
    }

    let mut code = read_code(item, script_type)?;
    if script_type == ScriptType::Python {
        code = api_module::expand(&code, &item.id, ctx.content_root, ctx.api_modules)?;
    }
    if ctx.options.stamp_version {
        code = stamp_pack_version(script_type, &code, ctx.metadata.current_version);
    }
    let name = item
        .body
        .get_str("name")
        .unwrap_or(item.id.as_str())
        .to_string();
    let code = match script_type {
        ScriptType::Python => {
            let clean = clean_python_code(&code);
            // CommonServer scripts carry their own markers
            if name.contains("CommonServer") {
                clean
            } else {
                register_module_lines(&name, &clean)
            }
        }
        ScriptType::PowerShell => clean_powershell_code(&code),
        ScriptType::JavaScript => code,
    };
    item.body.set_styled(fields.code, code, ScalarStyle::Folded);
    Ok(())
}

fn inline_image(item: &mut ContentItem) -> Result<()> {
    let Some(path) = item.sidecars.get(&SidecarKind::Image) else {
        debug!(item = %item.id, "no image sidecar");
        return Ok(());
    };
    let encoded = format!("{IMAGE_PREFIX}{}", STANDARD.encode(fs::read_bytes(path)?));
    let collides = item
        .body
        .get_str("image")
        .is_some_and(|existing| !existing.is_empty() && existing != encoded);
    if collides {
        return Err(PackError::ImageCollision {
            item: item.id.clone(),
        });
    }
    item.body.set_str("image", encoded);
    Ok(())
}

fn fetches_events(item: &ContentItem) -> bool {
    item.body.get_bool("script.isfetchevents") || item.body.get_bool("script.isfetcheventsandassets")
}

/// Whether the item folder holds a non-empty `README.md`
fn has_item_readme(item: &ContentItem) -> bool {
    item.sidecars
        .get(&SidecarKind::Readme)
        .is_some_and(|p| p.file_name().is_some_and(|n| n == "README.md"))
        && item.readme.as_deref().is_some_and(|r| !r.is_empty())
}

fn inline_description(ctx: &UnifyContext<'_>, item: &mut ContentItem) -> Result<()> {
    let mut description = match item.sidecars.get(&SidecarKind::Description) {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };
    if !description.is_empty()
        && ctx.metadata.support == SupportLevel::Partner
        && fetches_events(item)
        && !description.starts_with(PARTNER_FETCH_NOTICE)
    {
        description.insert_str(0, PARTNER_FETCH_NOTICE);
    }
    if !description.contains(DOC_LINK_LABEL) && has_item_readme(item) {
        let id = item.body.get_str("commonfields.id").unwrap_or(item.id.as_str());
        let link = format!(
            "{DOC_LINK_LABEL}({INTEGRATION_DOCS_REFERENCE}{})",
            normalize_integration_id(id)
        );
        if description.is_empty() {
            description = link;
        } else {
            description.push_str("\n\n---\n");
            description.push_str(&link);
        }
    }
    if !description.is_empty() {
        item.body
            .set_styled("detaileddescription", description, ScalarStyle::Folded);
    }
    Ok(())
}

fn append_label(item: &mut ContentItem, key: &str, suffix: &str) {
    if let Some(value) = item.body.get_str(key).filter(|v| !v.is_empty()) {
        let labelled = format!("{value}{suffix}");
        item.body.set_str(key, labelled);
    }
}

/// Append a custom label to name, id and display
pub fn add_custom_label(item: &mut ContentItem, label: &str) {
    let suffix = if item.kind == ContentKind::Script {
        label.to_string()
    } else {
        format!(" - {label}")
    };
    append_label(item, "name", &suffix);
    append_label(item, "commonfields.id", &suffix);
    if item.kind == ContentKind::Integration {
        append_label(item, "display", &suffix);
    }
}

/// Split off the 4.5 docker variant when `dockerimage45` is set
fn split_docker45(item: ContentItem, fields: &ScriptFields) -> Vec<ContentItem> {
    let Some(image45) = item.body.get(fields.docker45).cloned() else {
        return vec![item];
    };
    let mut main = item;
    main.body.remove(fields.docker45);
    if main.to_version < DOCKER45_FROM_VERSION {
        // Ends before 5.0.0: only the 4.5 image applies
        if main.from_version <= DOCKER45_TO_VERSION {
            main.body.set(fields.docker, image45);
            if main.to_version > DOCKER45_TO_VERSION {
                main.body.set_str("toversion", DOCKER45_TO_VERSION.to_string());
                main.to_version = DOCKER45_TO_VERSION;
            }
        }
        return vec![main];
    }
    let mut legacy = main.clone();

    if main.from_version < DOCKER45_FROM_VERSION {
        main.from_version = DOCKER45_FROM_VERSION;
        main.body.set_str("fromversion", DOCKER45_FROM_VERSION.to_string());
    }
    if legacy.from_version > DOCKER45_TO_VERSION {
        return vec![main];
    }
    legacy.body.set(fields.docker, image45);
    legacy.body.set_str("toversion", DOCKER45_TO_VERSION.to_string());
    legacy.to_version = DOCKER45_TO_VERSION;
    legacy.output_name = naming::with_suffix(&legacy.output_name, "_45");
    vec![main, legacy]
}

/// Unify an integration or script package
pub fn unify(ctx: &UnifyContext<'_>, mut item: ContentItem) -> Result<Unified> {
    let fields = script_fields(item.kind);
    if item.is_unified {
        debug!(item = %item.id, "already unified");
        return Ok(Unified::single(item));
    }

    inline_code(ctx, &mut item, &fields)?;
    if item.kind == ContentKind::Integration {
        inline_image(&mut item)?;
        inline_description(ctx, &mut item)?;
        contributors::add_support(&mut item, ctx.metadata);
    }
    if let Some(label) = ctx.options.custom_label.as_deref() {
        add_custom_label(&mut item, label);
    }
    item.refresh_identity()
        .map_err(|reason| unify::failed(item.id.clone(), reason))?;
    Ok(Unified {
        items: split_docker45(item, &fields),
        warnings: Vec::new(),
    })
}
