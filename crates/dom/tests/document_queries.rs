use dom::{DOMUpdate, Document, JOURNAL_LIMIT, NodeKey, parse_html};

const PAGE: &str = r##"<!DOCTYPE html>
<html>
  <head><title>Folio</title></head>
  <body>
    <nav class="navbar">
      <ul class="navbar-nav">
        <li><a class="nav-link" href="/">Home</a></li>
        <li><a class="nav-link extra" href="/about">About</a></li>
      </ul>
      <a href="#contact" id="jump">Contact</a>
    </nav>
    <section id="contact" class="contact-item stagger-animation">
      <p>One</p><p>Two</p>
    </section>
    <form id="contactForm">
      <div><input name="name" required></div>
      <div><input type="email" name="email" value="me@example.com"></div>
      <div><select name="topic"><option value="a">A</option><option value="b" selected>B</option></select></div>
      <div><textarea name="message">Hello</textarea></div>
    </form>
  </body>
</html>"##;

fn page() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    parse_html(PAGE).unwrap()
}

#[test]
fn descendant_and_child_queries_follow_document_order() {
    let doc = page();
    let links = doc.query_selector_all(".navbar-nav .nav-link").unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(doc.attribute(links[0], "href"), Some("/"));
    assert_eq!(doc.attribute(links[1], "href"), Some("/about"));

    let direct = doc.query_selector_all("ul > .nav-link").unwrap();
    assert!(direct.is_empty(), "links are grandchildren of the list");

    let fragments = doc.query_selector_all("a[href^=\"#\"]").unwrap();
    assert_eq!(fragments, vec![doc.get_element_by_id("jump").unwrap()]);
}

#[test]
fn selector_lists_do_not_duplicate_matches() {
    let doc = page();
    let hits = doc
        .query_selector_all(".contact-item, .stagger-animation, section")
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn invalid_selector_is_an_error() {
    let doc = page();
    assert!(doc.query_selector("#").is_err());
    assert!(doc.query_selector("a:hover").is_err());
}

#[test]
fn class_and_style_mutations_are_journalled() {
    let mut doc = page();
    let _parse = doc.take_updates();
    let section = doc.get_element_by_id("contact").unwrap();

    doc.add_class(section, "visible").unwrap();
    doc.add_class(section, "visible").unwrap();
    doc.set_style_property(section, "opacity", "0").unwrap();
    doc.set_style_property(section, "transform", "translateY(30px)").unwrap();
    doc.set_style_property(section, "opacity", "1").unwrap();

    assert!(doc.has_class(section, "visible"));
    assert_eq!(doc.style_property(section, "opacity").as_deref(), Some("1"));
    assert_eq!(
        doc.attribute(section, "style"),
        Some("opacity: 1; transform: translateY(30px);")
    );

    let updates = doc.take_updates();
    assert_eq!(updates.len(), 4, "re-adding a class must not journal: {updates:?}");
    assert!(matches!(
        &updates[0],
        DOMUpdate::SetAttr { name, value, .. } if name == "class" && value.ends_with("visible")
    ));

    doc.remove_class(section, "visible").unwrap();
    assert!(!doc.has_class(section, "visible"));
    assert!(doc.has_class(section, "stagger-animation"));
}

#[test]
fn text_content_updates_a_lone_text_child_in_place() {
    let mut doc = page();
    let section = doc.get_element_by_id("contact").unwrap();
    let para = doc.element_children(section)[0];
    let text_node = doc.children(para)[0];

    doc.take_updates();
    doc.set_text_content(para, "Uno").unwrap();
    assert_eq!(doc.text_content(para), "Uno");
    assert_eq!(doc.children(para), vec![text_node]);
    assert_eq!(
        doc.take_updates(),
        vec![DOMUpdate::SetText {
            node: text_node,
            text: "Uno".to_owned()
        }]
    );

    doc.set_text_content(section, "").unwrap();
    assert!(doc.children(section).is_empty());
    assert!(!doc.contains(para));
}

#[test]
fn form_controls_report_defaults_and_reset() {
    let mut doc = page();
    let form = doc.get_element_by_id("contactForm").unwrap();
    let controls = doc.form_controls(form);
    assert_eq!(controls.len(), 4);
    let [name, email, topic, message] = [controls[0], controls[1], controls[2], controls[3]];

    assert_eq!(doc.value(name), "");
    assert_eq!(doc.value(email), "me@example.com");
    assert_eq!(doc.value(topic), "b");
    assert_eq!(doc.value(message), "Hello");
    assert_eq!(doc.control_type(email).as_deref(), Some("email"));
    assert_eq!(doc.control_type(name).as_deref(), Some("text"));

    doc.set_value(name, "Ada").unwrap();
    doc.set_value(message, "Hi there").unwrap();
    assert_eq!(doc.value(name), "Ada");

    doc.reset_form(form).unwrap();
    assert_eq!(doc.value(name), "");
    assert_eq!(doc.value(message), "Hello");
    assert!(doc.set_value(form, "x").is_err());
}

#[test]
fn removing_a_subtree_forgets_every_key() {
    let mut doc = page();
    let section = doc.get_element_by_id("contact").unwrap();
    let inner = doc.descendants(section);
    doc.remove_node(section).unwrap();
    assert!(!doc.contains(section));
    assert!(inner.iter().all(|node| !doc.contains(*node)));
    assert!(doc.get_element_by_id("contact").is_none());
    assert!(doc.remove_node(NodeKey::ROOT).is_err());
}

#[test]
fn closest_walks_inclusive_ancestors() {
    let doc = page();
    let link = doc.get_element_by_id("jump").unwrap();
    assert_eq!(
        doc.closest(link, "nav").unwrap(),
        doc.query_selector(".navbar").unwrap()
    );
    assert_eq!(doc.closest(link, "a").unwrap(), Some(link));
    assert_eq!(doc.closest(link, "form").unwrap(), None);
}

#[test]
fn json_snapshot_is_sorted_and_skips_comments() {
    let mut doc = Document::new();
    let div = doc.create_element("DIV");
    doc.set_attribute(div, "title", "t").unwrap();
    doc.set_attribute(div, "class", "c").unwrap();
    let comment = doc.create_comment("hidden");
    doc.append_child(doc.root(), div).unwrap();
    doc.append_child(div, comment).unwrap();
    let json = doc.to_json_value();
    let element = &json["children"][0];
    assert_eq!(element["tag"], "div");
    let keys: Vec<&String> = element["attrs"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["class", "title"]);
    assert_eq!(element["children"].as_array().unwrap().len(), 0);
    assert!(format!("{doc:?}").contains("<!--hidden-->"));
}

#[test]
fn removing_an_attribute_is_journalled_once() {
    let mut doc = page();
    let _parse = doc.take_updates();
    let input = doc.query_selector("[name=\"name\"]").unwrap().unwrap();
    doc.remove_attribute(input, "REQUIRED").unwrap();
    doc.remove_attribute(input, "required").unwrap();
    assert!(!doc.has_attribute(input, "required"));
    assert_eq!(doc.pending_updates(), 1);
    assert_eq!(
        doc.take_updates(),
        vec![DOMUpdate::RemoveAttr {
            node: input,
            name: "required".to_owned(),
        }]
    );
    assert_eq!(doc.pending_updates(), 0);
}

#[test]
fn subtree_snapshots_cover_only_the_subtree() {
    let doc = page();
    let section = doc.get_element_by_id("contact").unwrap();
    let paragraph = doc.query_selector("#contact p").unwrap().unwrap();
    let link = doc.get_element_by_id("jump").unwrap();
    assert!(doc.is_inclusive_descendant(paragraph, section));
    assert!(doc.is_inclusive_descendant(section, section));
    assert!(!doc.is_inclusive_descendant(link, section));

    let json = doc.subtree_json(section);
    assert_eq!(json["tag"], "section");
    assert_eq!(json["children"].as_array().unwrap().len(), 2);
    assert_eq!(json["children"][1]["children"][0]["text"], "Two");

    let full: serde_json::Value = serde_json::from_str(&doc.to_json_string()).unwrap();
    assert_eq!(full, doc.to_json_value());
}

#[test]
fn an_undrained_journal_keeps_only_the_newest_updates() {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.append_child(doc.root(), div).unwrap();
    for step in 0..JOURNAL_LIMIT {
        doc.set_attribute(div, "data-step", &step.to_string()).unwrap();
    }
    assert_eq!(doc.pending_updates(), JOURNAL_LIMIT);
    assert_eq!(doc.dropped_updates(), 1);
    let updates = doc.take_updates();
    assert!(matches!(
        &updates[0],
        DOMUpdate::SetAttr { value, .. } if value == "0"
    ));
    assert_eq!(doc.pending_updates(), 0);
    assert_eq!(doc.dropped_updates(), 1);
}
