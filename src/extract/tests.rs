use super::*;
use crate::core::{SessionConfig, Timings};
use crate::model::{KnownTerms, SearchTerm};
use crate::page::{FixturePage, FixtureSite, PageAction};
use crate::stats::StatsTracker;
use std::sync::Arc;

const SENTINEL: &str = "No se encontró esta empresa en España";

fn config() -> SessionConfig {
    SessionConfig::default().with_timings(Timings::instant())
}

fn term(name: &str) -> SearchTerm {
    SearchTerm::parse(name).unwrap()
}

fn card(name: &str) -> String {
    format!(
        r#"<div class="Nv2PK"><div role="link" aria-label="{0}"><span>{0}</span></div></div>"#,
        name
    )
}

fn detail(name: &str, address: &str) -> String {
    format!(
        r#"<h1 class="DUwDvf lfPIob">{}</h1>
           <button data-item-id="address">{}</button>
           <button data-item-id="phone:tel:948000000">948 00 00 00</button>
           <a data-item-id="authority" href="https://{}.example/">web</a>
           <button class="DkEaL">Bodega</button>
           <button jsaction="pane.back" data-back>Atrás</button>"#,
        name,
        address,
        name.to_lowercase().replace(' ', "-")
    )
}

/// A search for "Acme" whose result list also shows two neighbours.
fn acme_site() -> FixtureSite {
    let results = format!(
        r#"<a class="hfpxzc" aria-label="Acme"></a>{}{}{}"#,
        card("ACME"),
        card("Bodegas Ochoa"),
        card("Conservas Pedro")
    );
    FixtureSite::default()
        .with_search("Acme España", results)
        .with_listing("Acme", detail("Acme SL", "Calle Mayor 1, 31500 Tudela, España"))
        .with_listing(
            "Bodegas Ochoa",
            detail("Bodegas Ochoa", "Calle Mayor 3, 31500 Tudela, España"),
        )
        .with_listing(
            "Conservas Pedro",
            detail("Conservas Pedro", "Polígono 2, 31500 Tudela, España"),
        )
}

#[tokio::test]
async fn test_extract_reads_every_field() {
    let extractor = ListingExtractor::new(&config()).unwrap();
    let mut page = FixturePage::new(acme_site());
    let journal = page.journal();

    let record = extractor.extract(&term("Acme"), &mut page).await;

    assert_eq!(record.queried_as, "Acme");
    assert_eq!(record.name, "Acme SL");
    assert_eq!(record.address, "Calle Mayor 1, 31500 Tudela, España");
    assert_eq!(record.phone, "948 00 00 00");
    assert_eq!(record.website, "https://acme-sl.example/");
    assert_eq!(record.maps_url, "https://maps.example/place/Acme");
    assert_eq!(record.category, "Bodega");
    assert_eq!(journal.submitted(), vec!["Acme España".to_string()]);
    assert_eq!(journal.opened(), vec!["Acme".to_string()]);
}

#[tokio::test]
async fn test_extract_outside_region_is_not_found() {
    let site = FixtureSite::default().with_search(
        "Acme España",
        detail("Acme SARL", "12 Rue de la Paix, 75002 Paris, France"),
    );
    let extractor = ListingExtractor::new(&config()).unwrap();
    let mut page = FixturePage::new(site);

    let record = extractor.extract(&term("Acme"), &mut page).await;

    assert_eq!(record.queried_as, "Acme");
    assert_eq!(record.name, SENTINEL);
    assert!(record.address.is_empty());
    assert!(record.phone.is_empty());
    assert!(record.website.is_empty());
    assert!(record.maps_url.is_empty());
    assert!(record.category.is_empty());
}

#[tokio::test]
async fn test_extract_without_results_is_not_found() {
    let extractor = ListingExtractor::new(&config()).unwrap();
    let mut page = FixturePage::new(FixtureSite::default());

    let record = extractor.extract(&term("Nadie SL"), &mut page).await;

    assert_eq!(record.name, SENTINEL);
    assert!(record.address.is_empty());
}

#[tokio::test]
async fn test_navigation_failure_is_not_found() {
    let site = acme_site().with_navigation_error("net::ERR_NAME_NOT_RESOLVED");
    let extractor = ListingExtractor::new(&config()).unwrap();
    let mut page = FixturePage::new(site);

    let record = extractor.extract(&term("Acme"), &mut page).await;

    assert_eq!(record.queried_as, "Acme");
    assert_eq!(record.name, SENTINEL);
}

#[tokio::test]
async fn test_missing_search_box_is_not_found() {
    let site = FixtureSite::new("<p>consent wall</p>")
        .with_search("Acme España", detail("Acme SL", "Calle Mayor 1, Tudela, España"));
    let extractor = ListingExtractor::new(&config()).unwrap();
    let mut page = FixturePage::new(site);
    let journal = page.journal();

    let record = extractor.extract(&term("Acme"), &mut page).await;

    assert_eq!(record.name, SENTINEL);
    assert!(journal.submitted().is_empty());
}

#[tokio::test]
async fn test_failed_field_read_leaves_field_empty() {
    let config = config();
    let site = acme_site().with_broken_selector(&config.selectors.phone);
    let stats = Arc::new(StatsTracker::new());
    let extractor = ListingExtractor::new(&config)
        .unwrap()
        .with_stats(Arc::clone(&stats));
    let mut page = FixturePage::new(site);

    let record = extractor.extract(&term("Acme"), &mut page).await;

    assert_eq!(record.name, "Acme SL");
    assert!(record.phone.is_empty());
    assert_eq!(record.category, "Bodega");
    assert_eq!(stats.get_stats().unavailable_fields, 1);
}

#[tokio::test]
async fn test_sibling_discovery_skips_input_terms() {
    let config = config();
    let stats = Arc::new(StatsTracker::new());
    let extractor = ListingExtractor::new(&config).unwrap();
    let discovery = RelatedDiscovery::new(&config)
        .unwrap()
        .with_stats(Arc::clone(&stats));
    let mut page = FixturePage::new(acme_site());
    let known = KnownTerms::from_terms(&[term("Acme")]);

    let primary = extractor.extract(&term("Acme"), &mut page).await;
    assert_eq!(primary.name, "Acme SL");

    let related = discovery
        .discover(&mut page, DiscoveryScope::Siblings, &known)
        .await;

    let names: Vec<&str> = related.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Bodegas Ochoa", "Conservas Pedro"]);
    assert!(related.iter().all(|r| r.queried_as == "Relacionado"));
    assert_eq!(related[1].address, "Polígono 2, 31500 Tudela, España");
    assert_eq!(related[1].maps_url, "https://maps.example/place/Conservas+Pedro");

    let stats = stats.get_stats();
    assert_eq!(stats.related_skipped_known, 1);
    assert_eq!(stats.card_failures, 0);
}

#[tokio::test]
async fn test_card_without_name_is_skipped() {
    let results = format!(
        r#"<a class="hfpxzc" aria-label="Acme"></a><div class="Nv2PK"><div role="link"></div></div>{}"#,
        card("Bodegas Ochoa")
    );
    let site = acme_site().with_search("Acme España", results);
    let config = config();
    let mut page = FixturePage::new(site);
    let known = KnownTerms::from_terms(&[term("Acme")]);

    ListingExtractor::new(&config)
        .unwrap()
        .extract(&term("Acme"), &mut page)
        .await;
    let related = RelatedDiscovery::new(&config)
        .unwrap()
        .discover(&mut page, DiscoveryScope::Siblings, &known)
        .await;

    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name, "Bodegas Ochoa");
}

#[tokio::test]
async fn test_locality_discovery_uses_first_populated_query() {
    let feed = format!(
        r#"<div role="feed">{}{}</div>"#,
        card("Bodegas Ochoa"),
        card("Acme")
    );
    let site = acme_site()
        .with_search("Empresas en Tudela España", feed)
        .with_search("Negocios en Tudela España", format!(r#"<div role="feed">{}</div>"#, card("Conservas Pedro")));
    let config = config();
    let stats = Arc::new(StatsTracker::new());
    let discovery = RelatedDiscovery::new(&config)
        .unwrap()
        .with_stats(Arc::clone(&stats));
    let mut page = FixturePage::new(site);
    let journal = page.journal();
    let known = KnownTerms::from_terms(&[term("acme")]);

    let related = discovery
        .discover(&mut page, DiscoveryScope::Locality("Tudela"), &known)
        .await;

    assert_eq!(related.len(), 1);
    assert_eq!(related[0].queried_as, "Relacionado (Tudela)");
    assert_eq!(related[0].name, "Bodegas Ochoa");
    assert_eq!(related[0].phone, "948 00 00 00");
    assert_eq!(
        journal.submitted(),
        vec!["Empresas en Tudela España".to_string()]
    );
    assert!(journal.actions().contains(&PageAction::Back));
    assert_eq!(stats.get_stats().localities_swept, 1);
    assert_eq!(stats.get_stats().related_skipped_known, 1);
}

#[tokio::test]
async fn test_locality_discovery_falls_through_empty_queries() {
    let site = acme_site()
        .with_search("Empresas en Tudela España", r#"<div role="feed"></div>"#)
        .with_search(
            "Negocios en Tudela España",
            format!(
                r#"<div role="feed">{}{}</div>"#,
                card("Bodegas Ochoa"),
                card("Conservas Pedro")
            ),
        );
    let config = config();
    let mut page = FixturePage::new(site);
    let journal = page.journal();

    let related = RelatedDiscovery::new(&config)
        .unwrap()
        .discover(
            &mut page,
            DiscoveryScope::Locality("Tudela"),
            &KnownTerms::default(),
        )
        .await;

    let names: Vec<&str> = related.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Bodegas Ochoa", "Conservas Pedro"]);
    assert_eq!(journal.submitted().len(), 2);
    assert_eq!(
        journal
            .actions()
            .iter()
            .filter(|a| **a == PageAction::Back)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_locality_without_results_yields_nothing() {
    let config = config();
    let mut page = FixturePage::new(acme_site());
    let journal = page.journal();

    let related = RelatedDiscovery::new(&config)
        .unwrap()
        .discover(
            &mut page,
            DiscoveryScope::Locality("Cascante"),
            &KnownTerms::default(),
        )
        .await;

    assert!(related.is_empty());
    assert_eq!(journal.submitted().len(), 2);
}

#[tokio::test]
async fn test_card_that_never_opens_is_skipped() {
    let results = format!(
        r#"<a class="hfpxzc" aria-label="Acme"></a>{}{}"#,
        card("Acme"),
        card("Phantom Co")
    );
    let site = acme_site().with_search("Acme España", results);
    let config = config();
    let stats = Arc::new(StatsTracker::new());
    let mut page = FixturePage::new(site);
    let known = KnownTerms::from_terms(&[term("Acme")]);

    let primary = ListingExtractor::new(&config)
        .unwrap()
        .extract(&term("Acme"), &mut page)
        .await;
    assert_eq!(primary.name, "Acme SL");

    let related = RelatedDiscovery::new(&config)
        .unwrap()
        .with_stats(Arc::clone(&stats))
        .discover(&mut page, DiscoveryScope::Siblings, &known)
        .await;

    assert!(related.is_empty());
    let stats = stats.get_stats();
    assert_eq!(stats.card_failures, 1);
    assert_eq!(stats.related_skipped_known, 1);
}

#[tokio::test]
async fn test_locality_card_that_never_opens_writes_no_empty_row() {
    let site = acme_site().with_search(
        "Empresas en Tudela España",
        format!(
            r#"<div role="feed">{}{}</div>"#,
            card("Phantom Co"),
            card("Bodegas Ochoa")
        ),
    );
    let config = config();
    let stats = Arc::new(StatsTracker::new());
    let mut page = FixturePage::new(site);

    let related = RelatedDiscovery::new(&config)
        .unwrap()
        .with_stats(Arc::clone(&stats))
        .discover(
            &mut page,
            DiscoveryScope::Locality("Tudela"),
            &KnownTerms::default(),
        )
        .await;

    let names: Vec<&str> = related.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Bodegas Ochoa"]);
    assert_eq!(stats.get_stats().card_failures, 1);
}
