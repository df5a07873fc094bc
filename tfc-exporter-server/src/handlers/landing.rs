use axum::response::Html;

const LANDING_PAGE: &str = r#"<html>
<head><title>Terraform Cloud/Enterprise Exporter</title></head>
<body>
<h1>Terraform Cloud/Enterprise Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

pub async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
