use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use super::*;
use crate::bundler::compiler::testing::InlineCompiler;
use crate::config::test_config_at;
use crate::route::{ContentHash, RouteKind};
use crate::utils::path::normalize_path;

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        Self { _temp: temp, root }
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn blog_app(&self) {
        self.write("components/header.js", "export const header = 'header';");
        self.write(
            "pages/page.js",
            "import { header } from '../components/header.js';\nexport default () => header;",
        );
        self.write(
            "pages/blog/[slug]/page.js",
            "import { LitElement } from 'lit';\nimport { header } from '../../../components/header.js';\nexport default () => 'post';",
        );
        self.write(
            "pages/api/[id]/route.js",
            "export async function GET() {}\nexport async function POST() {}",
        );
    }

    async fn gateway_with(
        &self,
        mode: RuntimeMode,
        compiler: InlineCompiler,
    ) -> Gateway<InlineCompiler> {
        let config = test_config_at(&self.root, "");
        let hierarchy = Arc::new(RouteHierarchy::from_config(&config));
        hierarchy.scan().await.unwrap();
        Gateway::new(
            hierarchy,
            Arc::new(compiler),
            GatewayOptions::from_config(&config, mode),
        )
    }

    async fn dev(&self) -> Gateway<InlineCompiler> {
        self.gateway_with(RuntimeMode::Development, InlineCompiler::default())
            .await
    }
}

fn page_hash(pattern: &str) -> String {
    ContentHash::for_route(pattern, RouteKind::Page, None).to_hex()
}

#[tokio::test]
async fn test_resolve_page_inlines_imports() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;

    let body = gateway
        .resolve(AssetKind::Page, &page_hash("/blog/:slug"))
        .await
        .unwrap();
    let text = body.as_compiled().unwrap();

    assert!(text.contains("export const header = 'header';"));
    assert!(!text.contains("import "));
    assert_eq!(body.content_type(), "application/javascript");
}

#[tokio::test]
async fn test_unknown_and_malformed_hash_not_found() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;

    for id in [page_hash("/missing"), "zz".to_string(), String::new()] {
        let err = gateway.resolve(AssetKind::Page, &id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), 404);
    }
}

#[tokio::test]
async fn test_data_route_has_no_client_bundle() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;

    let hash = ContentHash::for_route("/api/:id", RouteKind::DataRoute, None).to_hex();
    assert!(gateway.hierarchy().lookup_by_hash(&hash).is_some());

    let err = gateway.resolve(AssetKind::Page, &hash).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pages_recompile_components_cached() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;
    let hash = page_hash("/");

    gateway.resolve(AssetKind::Page, &hash).await.unwrap();
    gateway.resolve(AssetKind::Page, &hash).await.unwrap();
    assert_eq!(gateway.compiler.calls(), 2);

    gateway.resolve(AssetKind::Component, "header").await.unwrap();
    gateway.resolve(AssetKind::Component, "header").await.unwrap();
    assert_eq!(gateway.compiler.calls(), 3);
}

#[tokio::test]
async fn test_page_reflects_latest_source() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;
    let hash = page_hash("/");

    gateway.resolve(AssetKind::Page, &hash).await.unwrap();
    fx.write("pages/page.js", "export default () => 'changed';");
    let body = gateway.resolve(AssetKind::Page, &hash).await.unwrap();

    assert!(body.as_compiled().unwrap().contains("changed"));
}

#[tokio::test]
async fn test_concurrent_page_requests_coalesce() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx
        .gateway_with(
            RuntimeMode::Development,
            InlineCompiler::with_delay(Duration::from_millis(50)),
        )
        .await;
    let hash = page_hash("/");

    let (a, b) = tokio::join!(
        gateway.resolve(AssetKind::Page, &hash),
        gateway.resolve(AssetKind::Page, &hash),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(gateway.compiler.calls(), 1);
}

#[tokio::test]
async fn test_component_names() {
    let fx = Fixture::new();
    fx.blog_app();
    fx.write("components/forms/input.ts", "export const input = 1;");
    fx.write("components/card/index.js", "export const card = 1;");
    fx.write("secret.js", "export const secret = 1;");
    let gateway = fx.dev().await;

    assert!(gateway.resolve(AssetKind::Component, "forms/input").await.is_ok());
    assert!(gateway.resolve(AssetKind::Component, "card").await.is_ok());
    assert!(gateway.resolve(AssetKind::Component, "header.js").await.is_ok());

    for name in ["../secret", "/etc/passwd", "missing", ""] {
        let err = gateway
            .resolve(AssetKind::Component, name)
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{name} should not resolve");
    }
}

#[tokio::test]
async fn test_layouts_are_not_cached() {
    let fx = Fixture::new();
    fx.write("layouts/main.js", "export const main = 'v1';");
    let gateway = fx.dev().await;

    gateway.resolve(AssetKind::Layout, "main").await.unwrap();
    fx.write("layouts/main.js", "export const main = 'v2';");
    let body = gateway.resolve(AssetKind::Layout, "main").await.unwrap();

    assert!(body.as_compiled().unwrap().contains("v2"));
    assert_eq!(gateway.compiler.calls(), 2);
}

#[tokio::test]
async fn test_compile_error_is_distinct() {
    let fx = Fixture::new();
    fx.write("components/broken.js", "SYNTAX ERROR here");
    let gateway = fx.dev().await;

    let err = gateway
        .resolve(AssetKind::Component, "broken")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("Unexpected token"));
    match err {
        ResolveError::Compile { entry, .. } => assert!(entry.ends_with("components/broken.js")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalidate_recompiles_component() {
    let fx = Fixture::new();
    fx.blog_app();
    let gateway = fx.dev().await;

    gateway.resolve(AssetKind::Component, "header").await.unwrap();
    fx.write("components/header.js", "export const header = 'new';");

    let generation = gateway.invalidate(&fx.root.join("components/header.js"));
    assert_eq!(generation, 1);
    assert_eq!(gateway.generation(), 1);

    let body = gateway.resolve(AssetKind::Component, "header").await.unwrap();
    assert!(body.as_compiled().unwrap().contains("'new'"));
    assert_eq!(gateway.compiler.calls(), 2);
}

#[tokio::test]
async fn test_modules_resolve_through_node_modules() {
    let fx = Fixture::new();
    fx.write(
        "node_modules/lit/package.json",
        r#"{"exports": {".": {"import": "./index.js"}}}"#,
    );
    fx.write("node_modules/lit/index.js", "export class LitElement {}");
    let gateway = fx.dev().await;

    let body = gateway.resolve(AssetKind::Module, "lit").await.unwrap();
    assert!(body.as_compiled().unwrap().contains("LitElement"));
    gateway.resolve(AssetKind::Module, "lit").await.unwrap();
    assert_eq!(gateway.compiler.calls(), 1);

    // Edits outside node_modules leave third-party modules alone.
    gateway.invalidate(&fx.root.join("pages/page.js"));
    gateway.resolve(AssetKind::Module, "lit").await.unwrap();
    assert_eq!(gateway.compiler.calls(), 1);

    let err = gateway
        .resolve(AssetKind::Module, "./local.js")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_production_serves_prebuilt_files() {
    let fx = Fixture::new();
    fx.blog_app();
    let hash = page_hash("/blog/:slug");
    fx.write(&format!("build/js/pages/{hash}.js"), "export{};");
    fx.write("build/js/modules/lit.js", "export{};");

    let gateway = fx
        .gateway_with(RuntimeMode::Production, InlineCompiler::default())
        .await;

    let page = gateway.resolve(AssetKind::Page, &hash).await.unwrap();
    assert_eq!(
        page.as_static(),
        Some(fx.root.join(format!("build/js/pages/{hash}.js")).as_path())
    );

    let module = gateway.resolve(AssetKind::Module, "lit").await.unwrap();
    assert!(module.as_static().is_some());

    // Home page was never built.
    let err = gateway
        .resolve(AssetKind::Page, &page_hash("/"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = gateway
        .resolve(AssetKind::Component, "header")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(gateway.compiler.calls(), 0);
}

#[test]
fn test_module_file_name() {
    assert_eq!(module_file_name("lit"), "lit.js");
    assert_eq!(
        module_file_name("@lit-labs/ssr-client/hydrate.js"),
        "@lit-labs/ssr-client/hydrate.js"
    );
}
