//! End-to-end tests of the packing pipeline

use std::fs;
use std::path::Path;

use mdk_core::cst::PreprocessorSymbols;
use mdk_core::producer::{SCRIPT_FILE_NAME, THUMBNAIL_FILE_NAME};
use mdk_core::{
    ArtifactKind, DryRunWriter, FileSystemWriter, MinifierLevel, PackContext, PackOptions,
    PackPipeline, Project, ProjectLoader, SymbolPattern,
};
use tempfile::TempDir;

fn options(level: MinifierLevel) -> PackOptions {
    PackOptions {
        minify: level,
        ..PackOptions::default()
    }
}

fn build(sources: &[(&str, &str)], options: PackOptions) -> String {
    let project = Project::from_sources("Demo", sources.iter().copied(), &options.symbols);
    let context = PackContext::for_project(&project, options);
    let pipeline = PackPipeline::default_for(&context).unwrap();
    pipeline.build_script(&project, &context).unwrap()
}

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const PROGRAM: &str = r#"using System;
using System.Collections.Generic;

namespace Demo
{
    // Entry point
    partial class Program
    {
        readonly List<int> numbers = new List<int>();

        /// <summary>Adds a value.</summary>
        void Add(int amount)
        {
            numbers.Add(amount * 2);
        }

        public void Main(string argument)
        {
            Add(argument.Length);
            Echo($"Total: {numbers.Count}");
        }
    }
}
"#;

#[test]
fn test_usings_are_hoisted_deterministically() {
    let sources = [
        ("A.cs", "using System.Text;\nusing System;\nclass A { }\n"),
        ("B.cs", "using System;\nusing System.Linq;\nclass B { }\n"),
    ];
    let first = build(&sources, options(MinifierLevel::None));
    assert_eq!(
        first,
        "using System.Text;\nusing System;\nusing System.Linq;\nclass A { }\nclass B { }\n"
    );
    for _ in 0..3 {
        assert_eq!(build(&sources, options(MinifierLevel::None)), first);
    }
}

#[test]
fn test_debug_blocks_follow_the_defined_symbols() {
    let source = "class Program\n{\n    void Main()\n    {\n#if DEBUG\n        Echo(\"debug\");\n#endif\n        Run();\n    }\n}\n";

    let release = build(&[("Program.cs", source)], options(MinifierLevel::None));
    assert!(!release.contains("debug"), "{release}");
    assert!(!release.contains("#if"), "{release}");
    assert!(release.contains("Run();"), "{release}");

    let debug_options = PackOptions {
        symbols: ["DEBUG"].into_iter().collect::<PreprocessorSymbols>(),
        ..options(MinifierLevel::None)
    };
    let debug = build(&[("Program.cs", source)], debug_options);
    assert!(debug.contains("Echo(\"debug\");"), "{debug}");
    assert!(!debug.contains("#endif"), "{debug}");
}

#[test]
fn test_negated_operands_stay_apart() {
    let source = "class Program\n{\n    public int x = 2 - - 1;\n    public int y = 2 - -1;\n}\n";
    let script = build(&[("Program.cs", source)], options(MinifierLevel::Full));
    assert_eq!(script.matches("2- -1").count(), 2, "{script}");
    assert!(!script.contains("2--1"), "{script}");
}

#[test]
fn test_minification_is_idempotent() {
    for level in [
        MinifierLevel::StripComments,
        MinifierLevel::Lite,
        MinifierLevel::Full,
    ] {
        let once = build(&[("Program.cs", PROGRAM)], options(level));
        assert!(!once.contains("Entry point"), "{level}: {once}");
        assert!(!once.contains("namespace"), "{level}: {once}");

        let twice = build(&[("Script.cs", once.as_str())], options(level));
        assert_eq!(twice, once, "{level}");
    }
}

#[test]
fn test_minimal_preserved_content_is_idempotent() {
    let source = "class Program\n{\n#region mdk preserve\nint keep;\n#endregion\n    void Main() { }\n}\n";
    for level in [MinifierLevel::StripComments, MinifierLevel::Lite] {
        let once = build(&[("Program.cs", source)], options(level));
        assert!(!once.contains("#region"), "{level}: {once}");
        let twice = build(&[("Script.cs", once.as_str())], options(level));
        assert_eq!(twice, once, "{level}");
    }
}

#[test]
fn test_preserved_regions_are_protected_on_the_first_pack_only() {
    let source = "class Program\n{\n#region mdk preserve\n    int   keep;\n#endregion\n        int    after;\n    void Main() { }\n}\n";
    let once = build(&[("Program.cs", source)], options(MinifierLevel::Lite));
    assert!(once.contains("int   keep;"), "{once}");
    assert!(once.contains("\nint after;\n"), "{once}");

    // the markers are gone, so the second pack minifies the content
    let twice = build(&[("Script.cs", once.as_str())], options(MinifierLevel::Lite));
    assert!(twice.contains("\nint keep;\nint after;\n"), "{twice}");
    let thrice = build(&[("Script.cs", twice.as_str())], options(MinifierLevel::Lite));
    assert_eq!(thrice, twice);
}

#[test]
fn test_full_minification_keeps_runtime_names() {
    let script = build(&[("Program.cs", PROGRAM)], options(MinifierLevel::Full));
    for name in ["Program", "Main", "Echo", "List", "Count"] {
        assert!(script.contains(name), "{name} missing: {script}");
    }
    assert!(!script.contains("amount"), "{script}");
    assert!(!script.contains('\n') || script.lines().all(|line| line.len() <= 120));
}

#[test]
fn test_trimmed_types_and_renamed_references_agree() {
    let source = "class Program\n{\n    void Main() { Echo(nameof(Helper)); Echo(typeof(Widget).Name); }\n}\nclass Helper { }\nclass Widget { }\nclass Unused { }\n";
    let script = build(
        &[("Program.cs", source)],
        PackOptions {
            trim: true,
            ..options(MinifierLevel::Full)
        },
    );
    assert!(!script.contains("Unused"), "{script}");
    assert!(!script.contains("Helper"), "{script}");
    assert_eq!(script.matches("class ").count(), 3, "{script}");

    let start = script.find("nameof(").unwrap() + "nameof(".len();
    let end = start + script[start..].find(')').unwrap();
    let renamed = &script[start..end];
    assert!(script.contains(&format!("class {renamed}{{")), "{script}");
}

#[test]
fn test_entry_rules_scope_trimming() {
    let source = "class Program { void Main() { } }\nclass Tools { public static void Run() { } }\nclass Other { }\n";
    let script = build(
        &[("Program.cs", source)],
        PackOptions {
            trim: true,
            entry_points: ["Program", "Program.Main", "Tools.*"]
                .into_iter()
                .map(|rule| SymbolPattern::parse(rule).unwrap())
                .collect(),
            ..options(MinifierLevel::None)
        },
    );
    assert!(script.contains("class Tools"), "{script}");
    assert!(!script.contains("class Other"), "{script}");
}

#[test]
fn test_macros_are_expanded() {
    let mut options = options(MinifierLevel::None);
    options.macros.insert("VERSION".into(), "1.2.0".into());
    let script = build(
        &[("Program.cs", "class Program\n{\n    const string Version = \"$VERSION$\";\n}\n")],
        options,
    );
    assert!(script.contains("\"1.2.0\""), "{script}");
}

#[test]
fn test_pack_writes_script_and_thumbnail() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("Demo");
    write(&root, "Program.cs", PROGRAM.as_bytes());
    write(&root, "Utility/Unused.cs", b"class Unused { }\n");
    write(&root, "bin/Debug/Generated.cs", b"class Generated { }\n");
    write(&root, "README.md", b"Demo script");
    write(&root, "thumb.png", &[0x89, b'P', b'N', b'G']);

    let options = PackOptions {
        trim: true,
        ..options(MinifierLevel::Lite)
    };
    let project = ProjectLoader::new(&options).unwrap().load(&root).unwrap();
    assert_eq!(project.documents().len(), 2);

    let context = PackContext::for_project(&project, options);
    let pipeline = PackPipeline::default_for(&context).unwrap();
    let outcome = pipeline.run(&project, &context, &FileSystemWriter).unwrap();

    let kinds: Vec<ArtifactKind> = outcome.artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ArtifactKind::Script, ArtifactKind::Thumbnail]);

    let written = fs::read_to_string(root.join("out").join(SCRIPT_FILE_NAME)).unwrap();
    assert!(written.starts_with("// Demo script\n"), "{written}");
    assert!(written.ends_with(&outcome.script));
    assert!(!written.contains("Unused"));
    assert!(!written.contains("Generated"));
    assert!(root.join("out").join(THUMBNAIL_FILE_NAME).is_file());
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("Demo");
    write(&root, "Program.cs", PROGRAM.as_bytes());

    let options = options(MinifierLevel::Lite);
    let project = ProjectLoader::new(&options).unwrap().load(&root).unwrap();
    let context = PackContext::for_project(&project, options).with_dry_run(true);
    let writer = DryRunWriter::new();
    let outcome = PackPipeline::default_for(&context)
        .unwrap()
        .run(&project, &context, &writer)
        .unwrap();

    assert_eq!(outcome.artifacts.len(), 1);
    assert_eq!(writer.recorded()[0].0, root.join("out").join(SCRIPT_FILE_NAME));
    assert!(!root.join("out").exists());
}
