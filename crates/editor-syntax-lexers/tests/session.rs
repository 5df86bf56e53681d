use editor_syntax::{
    FoldKind, InlineDispatcher, LanguageId, PipelineConfig, SyntaxSession, TextDocument, Token,
    TokenCategory,
};
use editor_syntax_lexers::builtin_registry;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(2));
    }
    condition()
}

fn settled(session: &SyntaxSession, revision: u64) -> bool {
    session.is_idle()
        && session.token_map().is_some_and(|m| m.revision == revision)
        && session.fold_layout().is_some_and(|f| f.revision == revision)
}

#[test]
fn test_java_session_tracks_edits_and_folds() {
    let document = Arc::new(TextDocument::new("class A {\n  void f() {\n  }\n}"));
    let session = SyntaxSession::new(
        document.clone(),
        Arc::new(builtin_registry()),
        Arc::new(InlineDispatcher),
        LanguageId::Java.as_str(),
        PipelineConfig::immediate(),
    )
    .unwrap();

    assert!(wait_for(|| settled(&session, 1)));
    let layout = session.fold_layout().unwrap();
    let mut regions: Vec<_> = layout
        .value
        .folds()
        .regions()
        .iter()
        .map(|r| (r.start_line, r.end_line, r.kind))
        .collect();
    regions.sort();
    assert_eq!(
        regions,
        vec![(0, 3, FoldKind::BraceBlock), (1, 2, FoldKind::BraceBlock)]
    );

    assert!(session.folding().collapse([1]));
    let layout = session.fold_layout().unwrap();
    assert_eq!(layout.value.visible().visible_line_count(), 3);

    // Opening a comment above the inner block turns the rest of the file into comment text.
    let offset = document.position_to_offset(1, 0);
    document.insert(offset, "/*\n");
    assert!(wait_for(|| settled(&session, 2)));

    let tokens = session.lexing().tokens_for_line(2);
    assert_eq!(tokens, vec![Token::new(0, 12, TokenCategory::BlockComment)]);
    let layout = session.fold_layout().unwrap();
    assert!(
        layout
            .value
            .folds()
            .regions()
            .iter()
            .any(|r| r.kind == FoldKind::BlockComment && r.start_line == 1 && r.end_line == 4)
    );

    session.dispose();
}

#[test]
fn test_unknown_language_uses_plain_text() {
    let document = Arc::new(TextDocument::new("{\n}"));
    let session = SyntaxSession::new(
        document,
        Arc::new(builtin_registry()),
        Arc::new(InlineDispatcher),
        "cobol",
        PipelineConfig::immediate(),
    )
    .unwrap();

    assert!(wait_for(|| settled(&session, 1)));
    assert!(session.fold_layout().unwrap().value.folds().is_empty());

    session.set_language("JSON");
    assert!(wait_for(|| {
        session.is_idle()
            && session
                .fold_layout()
                .is_some_and(|f| f.language.as_ref() == "json")
            && session
                .token_map()
                .is_some_and(|m| m.language.as_ref() == "json")
    }));
    assert_eq!(session.fold_layout().unwrap().value.folds().regions().len(), 1);
    assert_eq!(
        session.lexing().tokens_for_line(0),
        vec![Token::new(0, 1, TokenCategory::Punctuation)]
    );

    session.dispose();
}
