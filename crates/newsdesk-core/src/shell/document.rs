//! Full HTML document around a rendered body.

use super::node::Node;

pub fn document(title: &str, body: &Node) -> String {
    let title = Node::text(title).to_html();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body>
{body}
</body>
</html>"#,
        title = title,
        body = body.to_html(),
    )
}
