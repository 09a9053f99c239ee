use plugin_traffic_collector::{
    Error,
    Result,
};
use std::{
    fs,
    io::ErrorKind,
    path::Path,
};

/// Replaced by the resolved spreadsheet id wherever it occurs in a template.
pub const SPREADSHEET_ID_PLACEHOLDER: &[u8] = b"{{SPREADSHEET_ID}}";

const SORT_TEMPLATE: &[u8] = include_bytes!("templates/sort.json");
const CHART_TEMPLATE: &[u8] = include_bytes!("templates/chart.json");

/// Templates in the order they are applied.
const BUILT_IN: [(&str, &[u8]); 2] = [("sort", SORT_TEMPLATE), ("chart", CHART_TEMPLATE)];

/// A pre-authored structural request. The payload is forwarded without being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub payload: Vec<u8>,
}

impl Template {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn render(&self, spreadsheet_id: &str) -> Vec<u8> {
        replace_all(&self.payload, SPREADSHEET_ID_PLACEHOLDER, spreadsheet_id.as_bytes())
    }
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(at) = rest.windows(needle.len()).position(|window| window == needle) {
        out.extend_from_slice(&rest[..at]);
        out.extend_from_slice(replacement);
        rest = &rest[at + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}

/// The templates applied after the cell write, always sort before chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet(Vec<Template>);

impl TemplateSet {
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolves `names` to templates, preferring `<override_dir>/<name>.json` over the built-in.
    pub fn load(names: &[String], override_dir: &Path) -> Result<Self> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !BUILT_IN.iter().any(|(known, _)| *known == name.as_str()))
        {
            return Err(Error::Configuration(format!(
                "unknown spreadsheet template {unknown:?}, expected one of: sort, chart"
            )));
        }

        let mut templates = Vec::new();
        for (name, built_in) in BUILT_IN {
            if !names.iter().any(|wanted| wanted == name) {
                continue;
            }
            let path = override_dir.join(format!("{name}.json"));
            let payload = match fs::read(&path) {
                Ok(payload) => {
                    debug!(template = name, path = %path.display(), "using template override");
                    payload
                }
                Err(e) if e.kind() == ErrorKind::NotFound => built_in.to_vec(),
                Err(e) => {
                    return Err(Error::Configuration(format!(
                        "cannot read template {}: {e}",
                        path.display()
                    )))
                }
            };
            templates.push(Template::new(name, payload));
        }
        Ok(Self(templates))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|template| template.name.as_str()).collect()
    }
}
