//! Read-only filesystem resources.

use rmcp::model::{AnnotateAble, RawResource, RawResourceTemplate, Resource, ResourceTemplate};

use crate::workspace::WORKSPACE_URI;

const TEXT_MIME: &str = "text/plain";

pub fn list() -> Vec<Resource> {
    let mut workspace = RawResource::new(WORKSPACE_URI, "Current Workspace");
    workspace.description =
        Some("Directory tree and source files of the server's working directory".to_string());
    workspace.mime_type = Some(TEXT_MIME.to_string());
    vec![workspace.no_annotation()]
}

pub fn templates() -> Vec<ResourceTemplate> {
    [
        (
            "file://{path}",
            "File or directory",
            "Contents of a file, or a rendering of a directory",
        ),
        (
            "dir://{path}",
            "Directory",
            "Directory tree plus the contents of its source files",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, description)| {
        RawResourceTemplate {
            uri_template: uri_template.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some(TEXT_MIME.to_string()),
        }
        .no_annotation()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_the_workspace_resource() {
        let resources = list();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].raw.uri, WORKSPACE_URI);
    }

    #[test]
    fn templates_cover_files_and_directories() {
        let templates = templates();
        let uris: Vec<_> = templates.iter().map(|t| t.raw.uri_template.as_str()).collect();
        assert_eq!(uris, ["file://{path}", "dir://{path}"]);
        assert!(templates
            .iter()
            .all(|t| t.raw.mime_type.as_deref() == Some(TEXT_MIME)));

        let wire = serde_json::to_value(&templates[1]).unwrap();
        assert_eq!(wire["uriTemplate"], "dir://{path}");
        assert_eq!(wire["mimeType"], TEXT_MIME);
    }
}
