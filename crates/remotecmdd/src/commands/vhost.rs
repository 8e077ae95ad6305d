//! Rewrites the website's block inside the shared web server configuration.
//!
//! Each website owns one region of the file delimited by sentinel comments:
//!
//! ```text
//! # BEGIN website:42 config
//! <VirtualHost 10.0.0.1:80>
//!    ...
//! </VirtualHost>
//! # END website:42 config
//! ```
//!
//! An edit drops the existing region, drops blank lines everywhere else, and
//! appends a freshly rendered region, so repeating an edit with the same
//! arguments leaves the file unchanged. The whole read-rewrite-reload
//! sequence runs under a file lock owned by the website identifier.

use std::fs;
use std::sync::Arc;

use remotecmd_config::VirtualHostSettings;
use remotecmd_protocol::{ArgumentNode, CommandResult, ProcessorArguments};
use tracing::info;

use crate::dispatch::{Command, CommandError};
use crate::exec::CommandRunner;
use crate::lock::{FileLock, LockOptions};

use super::{CommandContext, run_checked};

const VHOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::vhost");

const DEFAULT_PORT: &str = "80";
const INDENT: &str = "   ";

/// Children rendered by the fixed part of a block rather than as directives.
const RESERVED_CHILDREN: &[&str] = &[
    "is_name_virtual_host",
    "ip",
    "port",
    "server_admin",
    "server_name",
    "server_alias",
    "document_root",
    "ServerAdmin",
    "ServerName",
    "DocumentRoot",
];

/// One `<VirtualHost>` block to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualHostSpec {
    /// Name-based hosts share a listener and omit the `LISTEN` line.
    pub is_name_based: bool,
    /// Address the host binds.
    pub ip: String,
    /// Port the host binds.
    pub port: String,
    /// Administrator contact.
    pub server_admin: String,
    /// Primary host name.
    pub server_name: String,
    /// Optional secondary host name.
    pub server_alias: Option<String>,
    /// Document root directory.
    pub document_root: String,
    /// Further directives copied into the block in order.
    pub extra_directives: Vec<ArgumentNode>,
}

impl VirtualHostSpec {
    /// Reads a `virtual_host` argument node.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] naming the first required child
    /// that is missing or blank.
    pub fn from_node(node: &ArgumentNode) -> Result<Self, CommandError> {
        let ip = node
            .child_value("ip")
            .ok_or_else(|| CommandError::validation("ip not defined in virtual host block"))?;
        let server_admin = node.child_value("server_admin").ok_or_else(|| {
            CommandError::validation(format!("server_admin not defined for virtual host: {ip}"))
        })?;
        let server_name = node.child_value("server_name").ok_or_else(|| {
            CommandError::validation(format!("server_name not defined for virtual host: {ip}"))
        })?;
        let document_root = node.child_value("document_root").ok_or_else(|| {
            CommandError::validation(format!(
                "document_root not defined for virtual host: {server_name}"
            ))
        })?;

        Ok(Self {
            is_name_based: node
                .child_value("is_name_virtual_host")
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true")),
            ip: ip.to_owned(),
            port: node.child_value("port").unwrap_or(DEFAULT_PORT).to_owned(),
            server_admin: server_admin.to_owned(),
            server_name: server_name.to_owned(),
            server_alias: node.child_value("server_alias").map(str::to_owned),
            document_root: document_root.to_owned(),
            extra_directives: node
                .children()
                .iter()
                .filter(|child| !RESERVED_CHILDREN.contains(&child.name()))
                .cloned()
                .collect(),
        })
    }

    fn render(&self, out: &mut String) {
        let address = format!("{}:{}", self.ip, self.port);
        if !self.is_name_based {
            push_line(out, &format!("LISTEN {address}"));
        }
        push_line(out, &format!("<VirtualHost {address}>"));
        push_line(out, &format!("{INDENT}ServerAdmin {}", self.server_admin));
        push_line(out, &format!("{INDENT}ServerName {}", self.server_name));
        if let Some(alias) = &self.server_alias {
            push_line(out, &format!("{INDENT}ServerAlias {alias}"));
        }
        push_line(out, &format!("{INDENT}DocumentRoot {}", self.document_root));
        for directive in &self.extra_directives {
            render_directive(out, directive, 1);
        }
        push_line(out, "</VirtualHost>");
    }
}

fn render_directive(out: &mut String, node: &ArgumentNode, depth: usize) {
    let indent = INDENT.repeat(depth);
    let value = node.value().map(str::trim).unwrap_or_default();
    if node.is_leaf() {
        if node.name() == "COMMENT" {
            push_line(out, &format!("{indent}{value}"));
        } else if value.is_empty() {
            push_line(out, &format!("{indent}{}", node.name()));
        } else {
            push_line(out, &format!("{indent}{} {value}", node.name()));
        }
        return;
    }

    if value.is_empty() {
        push_line(out, &format!("{indent}<{}>", node.name()));
    } else {
        push_line(out, &format!("{indent}<{} {value}>", node.name()));
    }
    for child in node.children() {
        render_directive(out, child, depth + 1);
    }
    push_line(out, &format!("{indent}</{}>", node.name()));
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Replaces the region owned by `website_id` in `original`.
///
/// # Errors
///
/// Returns [`CommandError::Resource`] when a BEGIN sentinel for the website
/// has no matching END sentinel.
pub(crate) fn rewrite_config(
    original: &str,
    website_id: &str,
    hosts: &[VirtualHostSpec],
) -> Result<String, CommandError> {
    let begin = format!("# BEGIN website:{website_id} config");
    let end = format!("# END website:{website_id} config");

    let mut retained = Vec::new();
    let mut inside_region = false;
    for line in original.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if inside_region {
            inside_region = !line.starts_with(&end);
            continue;
        }
        if line.starts_with(&begin) {
            inside_region = true;
            continue;
        }
        retained.push(line);
    }
    if inside_region {
        return Err(CommandError::resource(format!(
            "Config file error. BEGIN tag found for website: {website_id}, but no END tag found"
        )));
    }

    let mut out = String::new();
    for line in retained {
        if line.starts_with("# BEGIN") {
            out.push('\n');
        }
        push_line(&mut out, line);
    }
    out.push('\n');
    push_line(&mut out, &begin);
    for (index, host) in hosts.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        host.render(&mut out);
    }
    push_line(&mut out, &end);
    Ok(out)
}

/// Edits the virtual host region of one website and reloads the server.
pub struct VirtualHostEditor {
    settings: VirtualHostSettings,
    lock: LockOptions,
    runner: Arc<dyn CommandRunner>,
    website_id: String,
    hosts: Vec<VirtualHostSpec>,
}

impl VirtualHostEditor {
    /// Builds an editor from the shared context.
    #[must_use]
    pub fn new(context: &CommandContext) -> Self {
        Self {
            settings: context.virtual_hosts.clone(),
            lock: context.lock,
            runner: Arc::clone(&context.runner),
            website_id: String::new(),
            hosts: Vec::new(),
        }
    }

    fn apply(&self) -> Result<(), CommandError> {
        let config_file = self.settings.config_file()?;
        let lock_file = self.settings.lock_file()?;
        let restart_command = self.settings.restart_command()?;

        let _lock = FileLock::acquire(lock_file.as_std_path(), &self.website_id, &self.lock)?;
        if !config_file.exists() {
            return Err(CommandError::resource(format!(
                "apache config file: {config_file} does not exist"
            )));
        }
        let original = fs::read_to_string(config_file).map_err(|error| {
            CommandError::io(
                format!("failed to read apache config file: {config_file}"),
                config_file.as_std_path(),
                &error,
            )
        })?;
        let rewritten = rewrite_config(&original, &self.website_id, &self.hosts)?;
        fs::write(config_file, rewritten).map_err(|error| {
            CommandError::io(
                format!("failed to write apache config file: {config_file}"),
                config_file.as_std_path(),
                &error,
            )
        })?;
        info!(
            target: VHOST_TARGET,
            website = %self.website_id,
            hosts = self.hosts.len(),
            file = %config_file,
            "virtual host configuration rewritten"
        );

        run_checked(self.runner.as_ref(), restart_command)?;
        Ok(())
    }
}

impl Command for VirtualHostEditor {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        let website_id = arguments
            .value_of("website_id")
            .ok_or_else(|| CommandError::validation("website_id not set"))?;
        let hosts = arguments
            .named("virtual_host")
            .map(VirtualHostSpec::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        if hosts.is_empty() {
            return Err(CommandError::validation(format!(
                "no virtual_host blocks defined for website: {website_id}"
            )));
        }
        self.website_id = website_id.to_owned();
        self.hosts = hosts;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.apply()
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

/// Rewrites a proxy rule block so `new_url` forwards to `proxy_url`.
///
/// Returns `None` when there is nothing to change: `new_url` is absent or
/// equals `old_url`. Otherwise every blank line and every line tagged with
/// `line_id` is dropped and a single rewrite rule carrying the tag is
/// appended.
#[must_use]
pub fn change_custom_url(
    old_url: Option<&str>,
    new_url: Option<&str>,
    settings: &str,
    line_id: &str,
    proxy_url: &str,
) -> Option<String> {
    let target = new_url?;
    if old_url == Some(target) {
        return None;
    }

    let mut out = String::new();
    for line in settings
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.contains(line_id))
    {
        push_line(&mut out, line);
    }
    let escaped = target.chars().fold(String::new(), |mut text, ch| {
        if matches!(ch, '.' | '-') {
            text.push('\\');
        }
        text.push(ch);
        text
    });
    push_line(
        &mut out,
        &format!("RewriteRule ^{escaped}\\??(.*)    {proxy_url} [P,QSA,NC,L] {line_id}"),
    );
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn host() -> ArgumentNode {
        ArgumentNode::new("virtual_host")
            .with_child(ArgumentNode::leaf("ip", "10.0.0.1"))
            .with_child(ArgumentNode::leaf("server_admin", "a@foo.com"))
            .with_child(ArgumentNode::leaf("server_name", "foo.com"))
            .with_child(ArgumentNode::leaf("document_root", "/var/www/foo"))
    }

    fn host_spec(node: &ArgumentNode) -> VirtualHostSpec {
        VirtualHostSpec::from_node(node).expect("valid host")
    }

    #[rstest]
    fn empty_file_gains_a_single_region(host: ArgumentNode) {
        let text = rewrite_config("", "42", &[host_spec(&host)]).expect("rewrite");
        assert_eq!(
            text,
            "\n# BEGIN website:42 config\n\
             LISTEN 10.0.0.1:80\n\
             <VirtualHost 10.0.0.1:80>\n\
             \x20  ServerAdmin a@foo.com\n\
             \x20  ServerName foo.com\n\
             \x20  DocumentRoot /var/www/foo\n\
             </VirtualHost>\n\
             # END website:42 config\n"
        );
    }

    #[rstest]
    fn rewriting_twice_is_stable(host: ArgumentNode) {
        let original = "ServerRoot /etc/httpd\n\n# BEGIN website:7 config\nX\n# END website:7 config\n";
        let hosts = [host_spec(&host)];
        let once = rewrite_config(original, "42", &hosts).expect("first");
        let twice = rewrite_config(&once, "42", &hosts).expect("second");
        assert_eq!(once, twice);
        assert!(once.contains("\n\n# BEGIN website:7 config\nX\n# END website:7 config\n"));
    }

    #[rstest]
    fn existing_region_is_replaced(host: ArgumentNode) {
        let original = "# BEGIN website:42 config\nold\n# END website:42 config\nKeep\n";
        let text = rewrite_config(original, "42", &[host_spec(&host)]).expect("rewrite");
        assert!(!text.contains("old"));
        assert!(text.starts_with("Keep\n\n# BEGIN website:42 config\n"));
        assert_eq!(text.matches("# BEGIN website:42 config").count(), 1);
    }

    #[test]
    fn unterminated_region_is_a_structural_error() {
        let error = rewrite_config("# BEGIN website:42 config\nstuff\n", "42", &[])
            .expect_err("missing END must fail");
        assert_eq!(
            error.to_string(),
            "Config file error. BEGIN tag found for website: 42, but no END tag found"
        );
    }

    #[rstest]
    fn name_based_hosts_skip_listen_and_render_directives(host: ArgumentNode) {
        let node = host
            .with_child(ArgumentNode::leaf("is_name_virtual_host", "TRUE"))
            .with_child(ArgumentNode::leaf("port", "8080"))
            .with_child(ArgumentNode::leaf("server_alias", "www.foo.com"))
            .with_child(ArgumentNode::leaf("ServerName", "ignored.com"))
            .with_child(ArgumentNode::leaf("COMMENT", "# managed"))
            .with_child(
                ArgumentNode::new("Directory")
                    .with_value("/var/www/foo")
                    .with_child(ArgumentNode::leaf("AllowOverride", "None")),
            );
        let mut out = String::new();
        host_spec(&node).render(&mut out);
        assert_eq!(
            out,
            "<VirtualHost 10.0.0.1:8080>\n\
             \x20  ServerAdmin a@foo.com\n\
             \x20  ServerName foo.com\n\
             \x20  ServerAlias www.foo.com\n\
             \x20  DocumentRoot /var/www/foo\n\
             \x20  # managed\n\
             \x20  <Directory /var/www/foo>\n\
             \x20     AllowOverride None\n\
             \x20  </Directory>\n\
             </VirtualHost>\n"
        );
    }

    #[rstest]
    #[case("ip", "ip not defined in virtual host block")]
    #[case("server_admin", "server_admin not defined for virtual host: 10.0.0.1")]
    #[case("server_name", "server_name not defined for virtual host: 10.0.0.1")]
    #[case("document_root", "document_root not defined for virtual host: foo.com")]
    fn missing_host_fields_are_named(
        host: ArgumentNode,
        #[case] missing: &str,
        #[case] message: &str,
    ) {
        let mut node = ArgumentNode::new("virtual_host");
        for child in host.children().iter().filter(|child| child.name() != missing) {
            node.push_child(child.clone());
        }
        let error = VirtualHostSpec::from_node(&node).expect_err("must fail");
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn custom_url_is_unchanged_without_a_new_value() {
        assert_eq!(change_custom_url(Some("a"), None, "", "#id", "p"), None);
        assert_eq!(change_custom_url(Some("a"), Some("a"), "", "#id", "p"), None);
    }

    #[test]
    fn custom_url_replaces_the_tagged_rule() {
        let settings = "RewriteEngine On\n\nRewriteRule ^old\\??(.*) x [P] #site-9\n";
        let updated = change_custom_url(
            Some("old"),
            Some("my-shop.example"),
            settings,
            "#site-9",
            "http://backend/shop/$1",
        )
        .expect("changed");
        assert_eq!(
            updated,
            "RewriteEngine On\n\
             RewriteRule ^my\\-shop\\.example\\??(.*)    http://backend/shop/$1 [P,QSA,NC,L] #site-9\n"
        );
    }
}
