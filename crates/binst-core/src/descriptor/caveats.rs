//! Post-install caveats: a message template rendered after a successful
//! install. Pure presentation; nothing in the pipeline depends on it.

use std::path::Path;

use super::PackageDescriptor;

/// Expand `{name}`, `{version}`, `{binary}`, `{install_path}` and `{path}`
/// in `template`. Unknown or unterminated placeholders are kept verbatim.
pub fn render(template: &str, desc: &PackageDescriptor, installed_at: &Path) -> String {
    let install_dir = installed_at.parent().unwrap_or(installed_at);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match key {
            "name" => out.push_str(&desc.name),
            "version" => out.push_str(&desc.version),
            "binary" => out.push_str(&desc.binary),
            "install_path" => out.push_str(&install_dir.display().to_string()),
            "path" => out.push_str(&installed_at.display().to_string()),
            _ => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
