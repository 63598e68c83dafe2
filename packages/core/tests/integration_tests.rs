//! Integration tests for the drop pipeline

use dropzone_core::memory::{EmbedSnapshot, MemoryDropEvent, MemoryEditor, MemoryFile, MemoryNode};
use dropzone_core::{
    ConfigurationError, DragAndDrop, DropError, DropHook, DropOptions, DroppedFile, Editor, FileOutcome, HookOutcome,
    InstallError, RawDraggable, RuleTarget, Selection, DROP_EVENT,
};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;

fn png(name: &str, content: &[u8]) -> MemoryFile {
    MemoryFile::new(name, "image/png", content.to_vec())
}

fn text_rule() -> RawDraggable {
    RawDraggable::new("^text/", "pre", "data-content")
}

#[tokio::test]
async fn test_image_drop_embeds_data_url_at_selection() {
    let editor = Rc::new(MemoryEditor::with_text("hello"));
    editor.set_selection(Some(Selection::caret(2)));
    let _module = DragAndDrop::install(Rc::clone(&editor), DropOptions::default()).unwrap();

    let event = MemoryDropEvent::new(vec![png("a.png", &[1, 2, 3])]);
    assert_eq!(editor.editable_root().dispatch(DROP_EVENT, &event), 1);
    assert!(event.default_prevented());

    editor.run_pending().await;

    assert_eq!(editor.embeds(), vec![EmbedSnapshot {
        index: 2,
        kind: "image".to_string(),
        payload: "data:image/png;base64,AQID".to_string(),
    }]);
}

#[tokio::test]
async fn test_image_drop_without_selection_goes_to_end() {
    let editor = Rc::new(MemoryEditor::with_text("abc"));
    let _module = DragAndDrop::install(Rc::clone(&editor), DropOptions::default()).unwrap();

    editor
        .editable_root()
        .dispatch(DROP_EVENT, &MemoryDropEvent::new(vec![png("a.png", b"x")]));
    editor.run_pending().await;

    assert_eq!(editor.text_with_embeds(), "abc[image:data:image/png;base64,eA==]");
}

#[tokio::test]
async fn test_unmatched_drop_is_left_alone() {
    let editor = Rc::new(MemoryEditor::with_text("abc"));
    let _module = DragAndDrop::install(Rc::clone(&editor), DropOptions::default()).unwrap();

    let event = MemoryDropEvent::new(vec![MemoryFile::new("notes.txt", "text/plain", b"hi".to_vec())]);
    editor.editable_root().dispatch(DROP_EVENT, &event);

    assert_eq!(event.prevent_default_calls(), 0);
    assert_eq!(event.stop_propagation_calls(), 0);
    assert_eq!(editor.pending_tasks(), 0);

    editor.run_pending().await;
    assert_eq!(editor.text_with_embeds(), "abc");
    assert!(editor.editable_root().children().is_empty());
}

#[tokio::test]
async fn test_claimed_drop_suppresses_event_exactly_once() {
    let editor = Rc::new(MemoryEditor::new());
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default()).unwrap();

    let event = MemoryDropEvent::new(vec![
        png("a.png", b"a"),
        MemoryFile::new("b.txt", "text/plain", Vec::new()),
        png("c.png", b"c"),
    ]);
    let report = module.handle_drop(&event).unwrap().await;

    assert_eq!(event.prevent_default_calls(), 1);
    assert_eq!(event.stop_propagation_calls(), 1);
    assert_eq!(report.inserted(), 2);
}

#[tokio::test]
async fn test_override_appends_generic_element_to_drop_target() {
    let editor = Rc::new(MemoryEditor::new());
    let options = DropOptions::default()
        .with_draggables(vec![text_rule()])
        .with_hook(DropHook::from_fn(|_: MemoryFile, _| HookOutcome::Override("REPLACED".to_string())));
    let module = DragAndDrop::new(Rc::clone(&editor), options).unwrap();

    let target = MemoryNode::drop_target("section");
    let event = MemoryDropEvent::new(vec![MemoryFile::new("a.txt", "text/plain", b"original".to_vec())])
        .on(target.clone());
    let report = module.handle_drop(&event).unwrap().await;

    assert_eq!(report.outcomes, vec![FileOutcome::Appended {
        file: "a.txt".to_string(),
        tag: "pre".to_string(),
    }]);
    assert_eq!(target.to_html(), r#"<section><pre data-content="REPLACED"></pre></section>"#);
    assert!(editor.editable_root().children().is_empty());
}

#[tokio::test]
async fn test_unmarked_target_falls_back_to_container() {
    let editor = Rc::new(MemoryEditor::new());
    let options = DropOptions::default().with_draggables(vec![text_rule()]);
    let module = DragAndDrop::new(Rc::clone(&editor), options).unwrap();

    let plain = MemoryNode::element("p");
    let event = MemoryDropEvent::new(vec![MemoryFile::new("a.txt", "text/plain", b"hi".to_vec())]).on(plain.clone());
    module.handle_drop(&event).unwrap().await;

    assert!(plain.children().is_empty());
    let children = editor.editable_root().children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].attribute("data-content").as_deref(), Some("data:text/plain;base64,aGk="));
}

#[tokio::test]
async fn test_slow_first_file_still_lands_first() {
    let editor = Rc::new(MemoryEditor::new());

    let (tx, rx) = oneshot::channel::<()>();
    let gate = Rc::new(RefCell::new(Some(rx)));
    let signal = Rc::new(RefCell::new(Some(tx)));
    let settled = Rc::new(RefCell::new(Vec::new()));

    let settled_by_hook = Rc::clone(&settled);
    let hook = DropHook::new(move |file: MemoryFile, _target: RuleTarget| {
        let name = file.name();
        let wait = if name == "slow.png" { gate.borrow_mut().take() } else { None };
        let done = if name == "fast.png" { signal.borrow_mut().take() } else { None };
        let settled = Rc::clone(&settled_by_hook);

        async move {
            if let Some(rx) = wait {
                rx.await.unwrap();
            }
            settled.borrow_mut().push(name.clone());
            if let Some(tx) = done {
                tx.send(()).unwrap();
            }
            Ok::<_, DropError>(HookOutcome::Override(name))
        }
    });

    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default().with_hook(hook)).unwrap();
    let event = MemoryDropEvent::new(vec![png("slow.png", b""), png("fast.png", b"")]);
    module.handle_drop(&event).unwrap().await;

    assert_eq!(*settled.borrow(), vec!["fast.png", "slow.png"]);
    assert_eq!(editor.text_with_embeds(), "[image:slow.png][image:fast.png]");
}

#[tokio::test]
async fn test_veto_only_drops_that_file() {
    let editor = Rc::new(MemoryEditor::new());
    let hook = DropHook::from_fn(|file: MemoryFile, _| {
        if file.name().ends_with(".gif") {
            HookOutcome::Veto
        } else {
            HookOutcome::UseFallback
        }
    });
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default().with_hook(hook)).unwrap();

    let event = MemoryDropEvent::new(vec![
        png("a.png", b"a"),
        MemoryFile::new("skip.gif", "image/gif", b"g".to_vec()),
        png("c.png", b"c"),
    ]);
    let report = module.handle_drop(&event).unwrap().await;

    assert_eq!(report.vetoed(), 1);
    assert_eq!(report.outcomes[1], FileOutcome::Vetoed { file: "skip.gif".to_string() });
    assert_eq!(
        editor.text_with_embeds(),
        "[image:data:image/png;base64,YQ==][image:data:image/png;base64,Yw==]"
    );
}

#[tokio::test]
async fn test_override_never_reads_the_file() {
    let editor = Rc::new(MemoryEditor::new());
    let hook = DropHook::new(|file: MemoryFile, target: RuleTarget| async move {
        Ok::<_, DropError>(HookOutcome::Override(format!("/uploads/{}?as={}", file.name(), target.attribute)))
    });
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default().with_hook(hook)).unwrap();

    let file = png("a.png", b"never read");
    module
        .handle_drop(&MemoryDropEvent::new(vec![file.clone()]))
        .unwrap()
        .await;

    assert_eq!(file.read_count(), 0);
    assert_eq!(editor.text_with_embeds(), "[image:/uploads/a.png?as=src]");
}

#[tokio::test]
async fn test_fallback_outcome_reads_the_file() {
    let editor = Rc::new(MemoryEditor::new());
    let hook = DropHook::from_fn(|_: MemoryFile, _| HookOutcome::UseFallback);
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default().with_hook(hook)).unwrap();

    let file = png("a.png", b"abc");
    module
        .handle_drop(&MemoryDropEvent::new(vec![file.clone()]))
        .unwrap()
        .await;

    assert_eq!(file.read_count(), 1);
    assert_eq!(editor.embeds()[0].payload, "data:image/png;base64,YWJj");
}

#[tokio::test]
async fn test_failed_read_fails_only_its_slot() {
    let editor = Rc::new(MemoryEditor::new());
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default()).unwrap();

    let event = MemoryDropEvent::new(vec![
        MemoryFile::unreadable("broken.png", "image/png", "device not ready"),
        png("ok.png", b"ok"),
    ]);
    let report = module.handle_drop(&event).unwrap().await;

    assert_eq!(report.failed(), 1);
    match &report.outcomes[0] {
        FileOutcome::Failed { file, error } => {
            assert_eq!(file, "broken.png");
            assert!(matches!(error, DropError::Read { .. }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(editor.embeds().len(), 1);
    assert_eq!(editor.embeds()[0].payload, "data:image/png;base64,b2s=");
}

#[tokio::test]
async fn test_hook_error_fails_only_its_slot() {
    let editor = Rc::new(MemoryEditor::new());
    let hook = DropHook::new(|file: MemoryFile, _: RuleTarget| async move {
        if file.name() == "a.png" {
            Err(DropError::Hook("upload rejected".to_string()))
        } else {
            Ok(HookOutcome::Override("uploaded".to_string()))
        }
    });
    let module = DragAndDrop::new(Rc::clone(&editor), DropOptions::default().with_hook(hook)).unwrap();

    let event = MemoryDropEvent::new(vec![png("a.png", b""), png("b.png", b"")]);
    let report = module.handle_drop(&event).unwrap().await;

    assert_eq!(report.outcomes[0], FileOutcome::Failed {
        file: "a.png".to_string(),
        error: DropError::Hook("upload rejected".to_string()),
    });
    assert_eq!(editor.text_with_embeds(), "[image:uploaded]");
}

#[test]
fn test_first_matching_rule_wins() {
    let editor = Rc::new(MemoryEditor::new());
    let options = DropOptions::default().with_draggables(vec![
        RawDraggable::image(),
        RawDraggable::new("^image/png$", "a", "href"),
    ]);
    let module = DragAndDrop::new(editor, options).unwrap();

    let rule = module.rules().find("image/png").unwrap();
    assert_eq!(rule.tag(), "img");
}

#[test]
fn test_malformed_draggable_is_fatal() {
    let editor = Rc::new(MemoryEditor::new());
    let bad = RawDraggable {
        content_type_pattern: Some("^video/".to_string()),
        tag: None,
        attr: Some("src".to_string()),
    };
    let options = DropOptions::default().with_draggables(vec![RawDraggable::image(), bad.clone()]);

    let err = DragAndDrop::new(Rc::clone(&editor), options).err().unwrap();
    assert!(matches!(err, ConfigurationError::IncompleteDraggable { .. }));
    assert_eq!(err.invalid_draggable(), &bad);

    let options = DropOptions::default().with_draggables(vec![bad]);
    let err = DragAndDrop::install(Rc::clone(&editor), options).err().unwrap();
    assert!(matches!(err, InstallError::Configuration(_)));
    assert_eq!(editor.editable_root().listener_count(DROP_EVENT), 0);
}

#[test]
fn test_custom_container() {
    let editor = Rc::new(MemoryEditor::new());
    let container = MemoryNode::element("aside");
    let module = DragAndDrop::install(
        Rc::clone(&editor),
        DropOptions::default().with_container(container.clone()),
    )
    .unwrap();

    assert!(module.container().is_same_node(&container));
    assert_eq!(container.listener_count(DROP_EVENT), 1);
    assert_eq!(editor.editable_root().listener_count(DROP_EVENT), 0);
}

#[test]
fn test_detach_removes_listeners() {
    let editor = Rc::new(MemoryEditor::new());
    let module = DragAndDrop::install(Rc::clone(&editor), DropOptions::default()).unwrap();
    assert_eq!(module.listener_count(), 1);

    module.detach().unwrap();
    assert_eq!(module.listener_count(), 0);

    let event = MemoryDropEvent::new(vec![png("a.png", b"a")]);
    assert_eq!(editor.editable_root().dispatch(DROP_EVENT, &event), 0);
    assert!(!event.default_prevented());
}

#[test]
fn test_disposer_removes_single_listener() {
    let editor = Rc::new(MemoryEditor::new());
    let module = Rc::new(DragAndDrop::new(Rc::clone(&editor), DropOptions::default()).unwrap());

    let first = DragAndDrop::attach(&module).unwrap();
    let _second = DragAndDrop::attach(&module).unwrap();
    assert_eq!(editor.editable_root().listener_count(DROP_EVENT), 2);

    assert!(first.dispose().unwrap());
    assert_eq!(editor.editable_root().listener_count(DROP_EVENT), 1);
    assert_eq!(module.listener_count(), 1);
}

#[test]
fn test_listener_outliving_module_is_inert() {
    let editor = Rc::new(MemoryEditor::new());
    let module = DragAndDrop::install(Rc::clone(&editor), DropOptions::default()).unwrap();
    drop(module);

    let event = MemoryDropEvent::new(vec![png("a.png", b"a")]);
    assert_eq!(editor.editable_root().dispatch(DROP_EVENT, &event), 1);
    assert!(!event.default_prevented());
    assert_eq!(editor.pending_tasks(), 0);
}
