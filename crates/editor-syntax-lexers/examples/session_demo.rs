use editor_syntax::{LanguageId, PipelineConfig, QueueDispatcher, SyntaxSession, TextDocument};
use editor_syntax_lexers::builtin_registry;
use std::sync::Arc;
use std::time::Duration;

const SOURCE: &str = "\
/**
 * Greets people.
 */
public class Greeter {
    private final String name = \"world\";

    void greet() {
        System.out.println(\"Hello, \" + name);
    }
}";

fn main() {
    // RUST_LOG=debug shows scheduling, installs and fallbacks.
    env_logger::init();

    let document = Arc::new(TextDocument::new(SOURCE));
    let dispatcher = Arc::new(QueueDispatcher::new());
    let session = SyntaxSession::new(
        document.clone(),
        Arc::new(builtin_registry()),
        dispatcher.clone(),
        LanguageId::Java.as_str(),
        PipelineConfig::new().with_debounce(Duration::from_millis(50)),
    )
    .unwrap();

    session.folding().subscribe(|layout| {
        println!(
            "folds @ rev {}: {} regions, {} visible lines",
            layout.revision,
            layout.value.folds().regions().len(),
            layout.value.visible().visible_line_count()
        );
    });

    // The host "UI thread": drain installs until both pipelines caught up.
    let pump = |session: &SyntaxSession| {
        while !session.is_idle() || dispatcher.run_pending() > 0 {
            dispatcher.run_next_timeout(Duration::from_millis(20));
        }
    };
    pump(&session);

    for (line, tokens) in session.token_map().unwrap().value.lines().iter().enumerate() {
        println!("{line:>2}: {:?}", tokens.tokens());
    }

    // Collapse the javadoc and the method body.
    session.folding().collapse([0, 6]);

    // Typing inside the class only relexes the touched line.
    let offset = document.position_to_offset(4, 4);
    document.insert(offset, "protected ");
    pump(&session);

    let layout = session.fold_layout().unwrap();
    println!(
        "collapsed headers after edit: {:?}",
        layout.value.folds().collapsed_headers()
    );

    session.dispose();
}
