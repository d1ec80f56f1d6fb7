use simple_glossary_rs::{
    AutolinkConfig, Autolinker, DocumentContext, GlossaryTerm, GlossaryUris, MatchStrategy,
    SkipReason, autolink,
};

const SITE: &str = "https://docs.example.org";

fn uris() -> GlossaryUris {
    GlossaryUris::new(SITE)
}

fn linkers() -> Vec<Autolinker> {
    [MatchStrategy::Pattern, MatchStrategy::Markup]
        .into_iter()
        .map(|strategy| {
            Autolinker::new(AutolinkConfig {
                strategy,
                ..AutolinkConfig::default()
            })
        })
        .collect()
}

fn link_count(html: &str) -> usize {
    html.matches(r#"class="glossary-item""#).count()
}

#[test]
fn second_pass_changes_nothing() {
    let terms = uris().terms(["alpha", "beta gamma", "Delta"]);
    let content = "<p>Alpha and beta gamma meet delta. alpha again, delta again.</p>";
    for linker in linkers() {
        let once = linker.link(content, &terms, &DocumentContext::none());
        let twice = linker.link(&once, &terms, &DocumentContext::none());
        assert_eq!(once, twice, "strategy {}", linker.config().strategy);
        assert_eq!(link_count(&once), 3, "strategy {}", linker.config().strategy);
    }
}

#[test]
fn glossary_entry_never_links_itself() {
    let terms = uris().terms(["alpha", "beta"]);
    for linker in linkers() {
        let out = linker.link(
            "alpha beta alpha",
            &terms,
            &DocumentContext::glossary_entry("alpha"),
        );
        assert!(!out.contains("#alpha\""), "strategy {}", linker.config().strategy);
        assert_eq!(link_count(&out), 1);
    }
}

#[test]
fn only_whole_words_link() {
    let cat = uris().terms(["cat"]);
    let catalog = uris().terms(["catalog"]);
    for linker in linkers() {
        let content = "A catalog of catalogs";
        assert_eq!(linker.link(content, &cat, &DocumentContext::none()), content);
        let out = linker.link(content, &catalog, &DocumentContext::none());
        assert_eq!(
            out,
            format!(
                r#"A <a href="{SITE}/glossary/letter/c/#catalog" title="Glossary page for catalog" class="glossary-item">catalog</a> of catalogs"#
            )
        );
    }
}

#[test]
fn only_first_occurrence_links() {
    let terms = uris().terms(["alpha"]);
    for linker in linkers() {
        let out = linker.link("alpha alpha alpha", &terms, &DocumentContext::none());
        assert_eq!(link_count(&out), 1);
        assert!(out.starts_with("<a href="));
        assert!(out.ends_with("</a> alpha alpha"));
    }
}

#[test]
fn existing_link_to_target_blocks_linking() {
    let term = GlossaryTerm::new("alpha", "alpha");
    let content = r#"<a href="alpha">alpha</a> alpha"#;
    for linker in linkers() {
        let report = linker.link_report(content, std::slice::from_ref(&term), &DocumentContext::none());
        assert_eq!(report.content, content);
        assert_eq!(report.skipped[0].reason, SkipReason::AlreadyLinked);
    }
}

#[test]
fn attribute_text_is_not_linked() {
    let term = GlossaryTerm::new("alpha", "https://elsewhere.example/#alpha");
    let content = r#"<img alt="alpha">"#;
    for linker in linkers() {
        assert_eq!(
            linker.link(content, std::slice::from_ref(&term), &DocumentContext::none()),
            content
        );
    }
}

#[test]
fn paired_shortcode_text_is_not_linked() {
    let terms = uris().terms(["alpha"]);
    let content = "x [caption id=1] the alpha photo [/caption] y";
    for linker in linkers() {
        assert_eq!(
            linker.link(content, &terms, &DocumentContext::none()),
            content,
            "strategy {}",
            linker.config().strategy
        );
    }
}

#[test]
fn megabyte_documents_link_under_both_strategies() {
    let terms = uris().terms(["zeta"]);
    let content = "word ".repeat(200_000) + "zeta end";
    for linker in linkers() {
        let report = linker.link_report(&content, &terms, &DocumentContext::none());
        assert_eq!(report.linked, vec!["zeta".to_string()], "strategy {}", linker.config().strategy);
        assert!(report.content.ends_with(">zeta</a> end"));
    }
}

#[test]
fn heading_text_is_not_linked() {
    let terms = uris().terms(["Alpha"]);
    for linker in linkers() {
        let out = linker.link(
            "<h2>Alpha Beta</h2> Alpha appears here",
            &terms,
            &DocumentContext::none(),
        );
        assert!(out.starts_with("<h2>Alpha Beta</h2> <a href="));
        assert!(out.ends_with(">Alpha</a> appears here"));
    }
}

#[test]
fn output_is_deterministic() {
    let terms = uris().terms(["zeta", "eta", "theta", "iota"]);
    let content = "<div>iota theta</div><p>eta zeta [note eta] zeta</p>";
    let first = autolink(content, &terms, &DocumentContext::page("Greek"));
    let second = autolink(content, &terms, &DocumentContext::page("Greek"));
    assert_eq!(first, second);
    let fresh = Autolinker::default().link(content, &terms, &DocumentContext::page("Greek"));
    assert_eq!(first, fresh);
}

#[test]
fn blank_terms_are_ignored() {
    let terms = vec![
        GlossaryTerm::new("", "https://example.org/#"),
        GlossaryTerm::new("   ", "https://example.org/#"),
    ];
    for linker in linkers() {
        let report = linker.link_report("some   text", &terms, &DocumentContext::none());
        assert_eq!(report.content, "some   text");
        assert!(report.linked.is_empty());
        assert!(
            report
                .skipped
                .iter()
                .all(|skip| skip.reason == SkipReason::EmptyTitle)
        );
    }
}

#[test]
fn empty_term_list_is_a_no_op() {
    let content = "<p>untouched</p>";
    assert_eq!(autolink(content, &[], &DocumentContext::none()), content);
}

#[test]
fn terms_follow_supplied_order() {
    let content = "Use the API Gateway";
    let gateway_first = uris().terms(["API Gateway", "API"]);
    let out = autolink(content, &gateway_first, &DocumentContext::none());
    assert_eq!(link_count(&out), 1);
    assert!(out.contains(">API Gateway</a>"));

    let api_first = uris().terms(["API", "API Gateway"]);
    let out = autolink(content, &api_first, &DocumentContext::none());
    assert!(out.contains(">API</a> Gateway"));
}

#[test]
fn batch_linking_matches_single_calls() {
    let terms = uris().terms(["alpha", "beta"]);
    let documents: Vec<(&str, DocumentContext)> = vec![
        ("alpha beta", DocumentContext::none()),
        ("<h1>beta</h1> beta", DocumentContext::page("Intro")),
        ("alpha", DocumentContext::glossary_entry("alpha")),
    ];
    let linker = Autolinker::default();
    let batch = linker.link_many(&documents, &terms);
    for ((content, context), linked) in documents.iter().zip(&batch) {
        assert_eq!(&linker.link(content, &terms, context), linked);
    }
}
