use std::sync::Arc;
use std::time::Duration;

use action_locator::{
    AttributeMatcher, ErrorKind, Query, ResolutionOptions, ResolveOverrides, Resolver,
    ResolverDefaults, SelectorCatalog, StrategyKind, StrategyOptions,
};
use async_trait::async_trait;
use candidate_source::{
    CandidateSet, CandidateSource, ElementFixture, FixturePage, PageFixture, SourceError,
};
use steadyhand_core_types::Viewport;
use tokio::time::Instant;

fn resolver_for(page: &FixturePage) -> Resolver {
    let catalog = SelectorCatalog::from_entries([
        (
            "login.submit",
            vec!["#login-btn", "button[type=submit]", ".submit"],
        ),
        ("cart.add", vec![".add-to-cart"]),
    ])
    .unwrap();
    Resolver::new(Arc::new(page.clone()), Arc::new(catalog))
}

fn product_page() -> FixturePage {
    FixturePage::new(PageFixture::default())
        .with_viewport(800.0, 600.0)
        .with_element(
            ElementFixture::new("small")
                .selector(".add-to-cart")
                .with_box(0.0, 0.0, 50.0, 20.0)
                .with_text("Add to wishlist")
                .with_attribute("data-sku", "sku-1"),
        )
        .with_element(
            ElementFixture::new("large")
                .selector(".add-to-cart")
                .with_box(100.0, 100.0, 200.0, 100.0)
                .with_text("Add to cart")
                .with_attribute("data-sku", "sku-22"),
        )
        .with_element(
            ElementFixture::new("centered")
                .selector(".add-to-cart")
                .with_box(500.0, 500.0, 10.0, 10.0)
                .with_text("Add to cart")
                .with_attribute("data-sku", "sku-333"),
        )
}

async fn resolve_id(resolver: &Resolver, query: Query, options: ResolutionOptions) -> String {
    resolver
        .resolve(&query, &options)
        .await
        .unwrap()
        .unwrap()
        .element_id()
        .as_str()
        .to_string()
}

#[tokio::test]
async fn single_match_short_circuits_every_strategy() {
    let page = FixturePage::new(PageFixture::default())
        .with_element(ElementFixture::new("only").selector("#only").hidden());
    let resolver = resolver_for(&page);

    for strategy in StrategyKind::all() {
        let options = ResolutionOptions::default().with_strategy(strategy);
        let resolution = resolver
            .resolve(&Query::selector("#only"), &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolution.element_id().as_str(), "only");
        assert_eq!(resolution.total, 1);
    }
}

#[tokio::test]
async fn first_last_and_index() {
    let page = product_page();
    let resolver = resolver_for(&page);
    let query = Query::selector(".add-to-cart");

    assert_eq!(
        resolve_id(&resolver, query.clone(), ResolutionOptions::default()).await,
        "small"
    );
    assert_eq!(
        resolve_id(
            &resolver,
            query.clone(),
            ResolutionOptions::default().with_strategy(StrategyKind::Last)
        )
        .await,
        "centered"
    );
    assert_eq!(
        resolve_id(
            &resolver,
            query.clone(),
            ResolutionOptions::default()
                .with_strategy(StrategyKind::Index)
                .with_strategy_options(StrategyOptions::index(1))
        )
        .await,
        "large"
    );

    let err = resolver
        .resolve(
            &query,
            &ResolutionOptions::default()
                .with_strategy(StrategyKind::Index)
                .with_strategy_options(StrategyOptions::index(7)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
}

#[tokio::test]
async fn most_visible_and_closest_to_center() {
    let page = product_page();
    let resolver = resolver_for(&page);
    let query = Query::selector(".add-to-cart");

    let visible = ResolutionOptions::default().with_strategy(StrategyKind::MostVisible);
    assert_eq!(resolve_id(&resolver, query.clone(), visible).await, "large");

    let centered = ResolutionOptions::default().with_strategy(StrategyKind::ClosestToCenter);
    assert_eq!(resolve_id(&resolver, query, centered).await, "centered");
}

#[tokio::test]
async fn most_visible_falls_back_to_first_candidate() {
    let page = FixturePage::new(PageFixture::default())
        .with_viewport(100.0, 100.0)
        .with_element(
            ElementFixture::new("offscreen")
                .selector(".tile")
                .with_box(200.0, 0.0, 10.0, 10.0),
        )
        .with_element(ElementFixture::new("hidden").selector(".tile").hidden());
    let resolver = resolver_for(&page);

    let options = ResolutionOptions::default().with_strategy(StrategyKind::MostVisible);
    let resolution = resolver
        .resolve(&Query::selector(".tile"), &options)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.index, 0);
    assert_eq!(resolution.element_id().as_str(), "offscreen");
}

#[tokio::test]
async fn text_and_attribute_strategies() {
    let page = product_page();
    let resolver = resolver_for(&page);
    let query = Query::selector(".add-to-cart");

    let by_text = ResolutionOptions::default()
        .with_strategy(StrategyKind::ContainsText)
        .with_strategy_options(StrategyOptions::text("Add to cart"));
    assert_eq!(resolve_id(&resolver, query.clone(), by_text).await, "large");

    let by_pattern = ResolutionOptions::default()
        .with_strategy(StrategyKind::MatchesAttribute)
        .with_strategy_options(StrategyOptions::attribute(
            "data-sku",
            AttributeMatcher::pattern(r"^sku-\d{3}$").unwrap(),
        ));
    assert_eq!(
        resolve_id(&resolver, query.clone(), by_pattern).await,
        "centered"
    );

    let missing_text = ResolutionOptions::default().with_strategy(StrategyKind::ContainsText);
    let err = resolver.resolve(&query, &missing_text).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert_eq!(err.strategy(), Some(StrategyKind::ContainsText));

    let nothing = ResolutionOptions::default()
        .with_strategy(StrategyKind::ContainsText)
        .with_strategy_options(StrategyOptions::text("Checkout"))
        .throw_on_not_found(false);
    assert!(resolver.resolve(&query, &nothing).await.unwrap().is_none());
}

#[tokio::test]
async fn closest_to_reference_element() {
    let page = product_page().with_element(
        ElementFixture::new("price")
            .selector("#price")
            .with_box(480.0, 480.0, 10.0, 10.0),
    );
    let resolver = resolver_for(&page);

    let options = ResolutionOptions::default()
        .with_strategy(StrategyKind::ClosestToElement)
        .with_strategy_options(StrategyOptions::reference(Query::selector("#price")));
    assert_eq!(
        resolve_id(&resolver, Query::selector(".add-to-cart"), options).await,
        "centered"
    );

    let missing = ResolutionOptions::default()
        .with_strategy(StrategyKind::ClosestToElement)
        .with_strategy_options(StrategyOptions::reference(Query::selector("#nope")));
    let err = resolver
        .resolve(&Query::selector(".add-to-cart"), &missing)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    assert_eq!(err.target(), Some("#nope"));
}

#[tokio::test]
async fn resolution_is_idempotent_on_unchanged_page() {
    let page = product_page();
    let resolver = resolver_for(&page);
    let options = ResolutionOptions::default().with_strategy(StrategyKind::ClosestToCenter);

    let first = resolve_id(&resolver, Query::selector(".add-to-cart"), options.clone()).await;
    let second = resolve_id(&resolver, Query::selector(".add-to-cart"), options).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn no_match_honours_throw_on_not_found() {
    let page = product_page();
    let resolver = resolver_for(&page);

    let err = resolver
        .resolve(&Query::selector("#missing"), &ResolutionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    assert_eq!(err.target(), Some("#missing"));

    let quiet = resolver
        .resolve_with(
            &Query::selector("#missing"),
            &ResolveOverrides::new().throw_on_not_found(false),
        )
        .await
        .unwrap();
    assert!(quiet.is_none());
}

#[tokio::test]
async fn logical_key_heals_through_catalog() {
    let page = FixturePage::new(PageFixture::default())
        .with_element(ElementFixture::new("submit").selector("button[type=submit]"))
        .with_element(ElementFixture::new("other").selector(".submit"));
    let resolver = resolver_for(&page);

    let resolution = resolver
        .resolve(&Query::logical("login.submit"), &ResolutionOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.element_id().as_str(), "submit");
    assert_eq!(resolution.selector.as_deref(), Some("button[type=submit]"));

    let heal = resolution.heal.expect("healed");
    assert_eq!(heal.primary, "#login-btn");
    assert_eq!(heal.position, 1);

    // the third alternative is never evaluated
    assert!(!page.queried_selectors().iter().any(|s| s == ".submit"));
}

#[tokio::test]
async fn logical_key_without_healing_uses_primary_only() {
    let page = FixturePage::new(PageFixture::default())
        .with_element(ElementFixture::new("submit").selector("button[type=submit]"));
    let resolver = resolver_for(&page);

    let options = ResolutionOptions::default().self_healing(false);
    let err = resolver
        .resolve(&Query::logical("login.submit"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    assert_eq!(page.queried_selectors(), vec!["#login-btn"]);

    let err = resolver
        .resolve(&Query::logical("unknown.key"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSelector);
}

#[tokio::test]
async fn exhausted_catalog_is_self_healing_failure() {
    let page = FixturePage::new(PageFixture::default());
    let resolver = resolver_for(&page);

    let err = resolver
        .resolve(&Query::logical("login.submit"), &ResolutionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelfHealingFailed);
    assert_eq!(page.queried_selectors().len(), 3);
}

#[tokio::test]
async fn handle_query_resolves_to_itself() {
    let page = product_page();
    let resolver = resolver_for(&page);
    let handles = page.query(".add-to-cart").await.unwrap();
    let handle = handles[2].clone();
    page.clear_logs();

    let resolution = resolver
        .resolve(&Query::handle(handle), &ResolutionOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.element_id().as_str(), "centered");
    assert!(resolution.selector.is_none());
    assert!(page.queried_selectors().is_empty());
}

#[tokio::test]
async fn resolver_defaults_apply_when_caller_omits_options() {
    let page = product_page();
    let resolver = resolver_for(&page).with_defaults(ResolverDefaults {
        strategy: StrategyKind::Last,
        timeout: Duration::from_millis(250),
        throw_on_not_found: false,
        self_healing: true,
    });

    let effective = resolver.effective_options(&ResolveOverrides::new());
    assert_eq!(effective.strategy, StrategyKind::Last);
    assert_eq!(effective.timeout, Duration::from_millis(250));

    let picked = resolver
        .resolve_with(&Query::selector(".add-to-cart"), &ResolveOverrides::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(picked.element_id().as_str(), "centered");

    let overridden = resolver
        .resolve_with(
            &Query::selector(".add-to-cart"),
            &ResolveOverrides::new().strategy(StrategyKind::First),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overridden.element_id().as_str(), "small");
}

/// Page whose queries answer only after `delay`.
struct SlowPage {
    inner: FixturePage,
    delay: Duration,
}

#[async_trait]
impl CandidateSource for SlowPage {
    async fn query(&self, selector: &str) -> Result<CandidateSet, SourceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(selector).await
    }

    async fn viewport_size(&self) -> Result<Option<Viewport>, SourceError> {
        self.inner.viewport_size().await
    }

    async fn navigate(&self, url: &str) -> Result<(), SourceError> {
        self.inner.navigate(url).await
    }

    async fn current_url(&self) -> Result<String, SourceError> {
        self.inner.current_url().await
    }
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_with_context() {
    let page = SlowPage {
        inner: product_page(),
        delay: Duration::from_secs(10),
    };
    let resolver = Resolver::new(Arc::new(page), Arc::new(SelectorCatalog::empty()));
    let options = ResolutionOptions::default()
        .with_strategy(StrategyKind::Last)
        .with_timeout(Duration::from_millis(500));
    let started = Instant::now();

    let err = resolver
        .resolve(&Query::selector(".add-to-cart"), &options)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.target(), Some(".add-to-cart"));
    assert_eq!(err.strategy(), Some(StrategyKind::Last));
    assert!(err.message().contains("500ms"));
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}
