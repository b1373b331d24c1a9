//! Content Round-Trip Example
//!
//! Loads a directory of definition files plus one scene document, resolves
//! inheritance, edits a definition through the inspector, commits the edit
//! and writes the definition back out.
//!
//! Usage: `content_roundtrip [CONTENT_DIR] [OUTPUT_DIR]`

use defstack_core::{reflect_enum, reflect_record, Def, DefRecord, DefRef, TypeRegistry};
use defstack_index::{DefIndex, IndexConfig, Scope};
use defstack_inspector::{collect_rows, FieldInfo, Inspector, ListAction, Widgets};
use defstack_markup::{DefWriter, FsWriter, Markup, MemoryWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
struct StuffDef {
    label: String,
    hardness: u8,
}

reflect_record!(StuffDef { label, hardness });

impl Def for StuffDef {
    const TYPE_NAME: &'static str = "StuffDef";
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Quality {
    Poor,
    #[default]
    Normal,
    Good,
    Masterwork,
}

reflect_enum!(Quality {
    Poor,
    Normal,
    Good,
    Masterwork,
});

#[derive(Debug, Default, Clone)]
struct Stats {
    mass: f32,
    value: i32,
}

reflect_record!(Stats { mass, value });

#[derive(Debug, Default, Clone)]
struct ThingDef {
    label: String,
    quality: Quality,
    stats: Stats,
    tags: Vec<String>,
    stuff: DefRef<StuffDef>,
    /// Rebuilt at runtime, never stored
    description: String,
}

reflect_record!(ThingDef {
    label,
    quality,
    stats,
    tags,
    stuff,
});

impl Def for ThingDef {
    const TYPE_NAME: &'static str = "ThingDef";
}

impl ThingDef {
    fn describe(&mut self) {
        let stuff = self.stuff.get().map(|s| s.label.as_str()).unwrap_or("-");
        self.description = format!(
            "{} {:?} ({}), mass {}, value {}, tags {:?}",
            stuff, self.quality, self.label, self.stats.mass, self.stats.value, self.tags
        );
    }
}

/// Prints every field and answers with a fixed list of edits
struct ConsoleWidgets {
    depth: usize,
    edits: Vec<(&'static str, &'static str)>,
}

impl Widgets for ConsoleWidgets {
    fn field(&mut self, info: FieldInfo<'_>, text: &str) -> Option<String> {
        let marker = if info.overridden { '*' } else { ' ' };
        println!("{}{} {} = {:?}", "  ".repeat(self.depth), marker, info.label, text);
        self.edits
            .iter()
            .find(|(path, _)| *path == info.path)
            .map(|(_, edit)| {
                println!("{}  -> {:?}", "  ".repeat(self.depth), edit);
                edit.to_string()
            })
    }

    fn begin_group(&mut self, info: FieldInfo<'_>) -> bool {
        let marker = if info.overridden { '*' } else { ' ' };
        println!("{}{} {} ({})", "  ".repeat(self.depth), marker, info.label, info.shape);
        self.depth += 1;
        true
    }

    fn end_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn list_controls(&mut self, _info: FieldInfo<'_>, _len: usize) -> ListAction {
        ListAction::None
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let content = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("content"));
    let output = args.next().map(PathBuf::from);

    println!("=== Defstack Content Round-Trip Example ===\n");

    let types = TypeRegistry::new().with::<StuffDef>().with::<ThingDef>();
    log::debug!("registered types: {:?}", types.names().collect::<Vec<_>>());
    let markup = Markup::default();
    let mut index = DefIndex::new(IndexConfig::default());

    // Load global definitions and the scene
    let loaded = index.load(markup.load_directory(&content)?);
    println!("Loaded {} definitions from {}", loaded, content.display());

    let scene = markup.load_scene_file(content.join("Arena.scene"))?;
    let local = index.load_scene(scene.records);
    println!("Scene {}: {} local definitions\n", scene.name, local);

    // Enumerate every concrete ThingDef; unknown types are skipped with a warning
    println!("All things:");
    for resolved in index.all_of_type::<ThingDef>(&types) {
        let mut resolved = resolved?;
        resolved.def.describe();
        println!("  [{}] {}: {}", resolved.slot, resolved.name, resolved.def.description);
    }

    let arena: ThingDef = index.materialize_as(Scope::Scene, "ArenaSword", &types)?;
    println!(
        "\nScene-local ArenaSword inherits value {} from Sword\n",
        arena.stats.value
    );

    // Edit Sword next to its parent
    let parent: ThingDef = index.materialize_as(Scope::Global, "BaseWeapon", &types)?;
    let mut sword: ThingDef = index.materialize_as(Scope::Global, "Sword", &types)?;

    println!("Inspecting Sword (* = overrides BaseWeapon):");
    let mut widgets = ConsoleWidgets {
        depth: 1,
        edits: vec![
            ("quality", "Masterwork"),
            ("stats.mass", "2.25"),
            ("tags[1]", "blade"),
        ],
    };
    let mut inspector = Inspector::new();
    let changed = inspector.show(&mut widgets, &mut sword, Some(&parent));
    for rejected in inspector.rejected() {
        println!("  rejected: {}", rejected);
    }

    if changed {
        index.commit(Scope::Global, "Sword", &sword, &types)?;
    }
    let overrides = collect_rows(&sword, Some(&parent))
        .into_iter()
        .filter(|row| row.overridden && row.text.is_some())
        .count();
    println!("\n{} leaf fields of Sword now override BaseWeapon", overrides);

    let Some(record) = index.get("Sword") else {
        return Err("Sword is no longer indexed".into());
    };
    println!("\nCommitted body:\n{}", record.body);
    write_back(&markup, record, &content, output.as_deref())?;

    // Removing a definition frees its slot for the next one added
    if let Some(removed) = index.remove("Club") {
        let slot = index.slot_of(Scope::Global, "Club");
        println!("\nRemoved {} (slot now {:?})", removed.name, slot);
        let axe = DefRecord::new(ThingDef::TYPE_NAME, "Axe")
            .with_parent("BaseWeapon")
            .with_path(content.join("Things/Axe.xml"));
        if index.add(axe) {
            if let Some(slot) = index.slot_of(Scope::Global, "Axe") {
                println!("Added Axe into {}", slot);
            }
        }
    }

    println!("\n=== Done ===");
    Ok(())
}

fn write_back(
    markup: &Markup,
    record: &DefRecord,
    content: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = markup.write_record(record)?;
    let relative = record
        .path()
        .and_then(|p| p.strip_prefix(content).ok())
        .unwrap_or_else(|| Path::new("Sword.xml"));

    match output {
        Some(dir) => {
            let mut writer = FsWriter::rooted(dir);
            writer.write(relative, text.as_bytes());
            if writer.failures() == 0 {
                println!("Wrote {}", dir.join(relative).display());
            }
        }
        None => {
            let mut writer = MemoryWriter::new();
            writer.write(relative, text.as_bytes());
            println!("\n{}:", relative.display());
            println!("{}", writer.get_str(relative).unwrap_or_default());
        }
    }
    Ok(())
}
