//! Headless tour of the catalog and session plumbing: prints the built-in
//! catalog tree, then shows how load requests buffer before a surface
//! attaches (latest request wins).

use vesalius::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let catalog = Catalog::builtin();
    println!("built-in catalog:");
    for model in catalog.main_models() {
        println!("  {}  ({})", model.name, model.file_path);
        for subpart in catalog.subparts_of(&model.name) {
            println!("    {}  ({})", subpart.name, subpart.file_path);
        }
    }

    let mut selection = SelectionState::new();
    let first = catalog.main_models()[0].clone();
    let load = selection.apply(SelectionAction::SelectMain(first));
    println!("\nselecting the first entry loads: {:?}", load);
    println!("browser page is now: {:?}", selection.page());

    // Without a surface the session only buffers; the newest request
    // replaces the older one.
    let assets = AssetStore::new("assets");
    let mut session: RenderSession<ModelViewer> =
        RenderSession::new(assets.clone(), "environments/lightroom_14b.hdr");
    session.load_model("models/heart.glb");
    session.load_model("models/lungs.glb");
    println!("\nbuffered before attach: {:?}", session.pending_asset());

    // If the asset bundle is present, report the buffered model's size.
    if let Some(pending) = session.pending_asset() {
        let resolved = assets.resolve(pending);
        if resolved.exists() {
            let bytes = assets.read(pending)?;
            println!("{pending}: {} bytes on disk", bytes.len());
        } else {
            println!("(no asset bundle at {:?}; skipping read)", assets.root());
        }
    }
    Ok(())
}
