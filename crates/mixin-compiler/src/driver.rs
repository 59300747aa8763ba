/// Compiler driver that orchestrates the generation pipeline

use crate::compose::{ExtensionComposer, GeneratedExtension};
use crate::error::{CompileError, Result};
use crate::headers::HeaderResolver;
use crate::index::{DeclarationIndex, annotated_members};
use crate::manifest::{MANIFEST_FILE, MixinManifest, file_stem};
use crate::model::AnnotatedMember;
use mixin_parser::ParseOptions;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Generation output
#[derive(Debug)]
pub struct CompileOutput {
    /// Source file that was compiled (entry point)
    pub source_file: PathBuf,
    /// Every category interface, in annotation order
    pub declarations: String,
    /// Every category implementation, in annotation order
    pub definitions: String,
    pub extensions: Vec<GeneratedExtension>,
    /// Generated files by file name, manifest included
    pub files: BTreeMap<String, String>,
    /// Members skipped under `keep_going`
    pub diagnostics: Vec<CompileError>,
}

impl CompileOutput {
    pub fn manifest(&self) -> MixinManifest {
        let mut manifest = MixinManifest::new(file_name(&self.source_file));
        for extension in &self.extensions {
            manifest.add(extension);
        }
        manifest
    }

    /// Write every generated file into `dir`, creating it if needed
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (name, content) in &self.files {
            let path = dir.join(name);
            std::fs::write(&path, content)?;
            debug!(path = %path.display(), "wrote file");
            written.push(path);
        }
        Ok(written)
    }
}

/// Options for compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Input header or implementation file
    pub input: PathBuf,
    /// Output directory (optional, output is only returned without it)
    pub output_dir: Option<PathBuf>,
    /// Searched for quoted imports after the importing file's directory
    pub include_dirs: Vec<PathBuf>,
    /// Macro that marks provide annotations
    pub annotation_macro: String,
    /// Skip failing members instead of failing the run
    pub keep_going: bool,
}

impl CompileOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: None,
            include_dirs: Vec::new(),
            annotation_macro: ParseOptions::default().annotation_macro,
            keep_going: false,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs.extend(dirs);
        self
    }

    pub fn annotation_macro(mut self, name: impl Into<String>) -> Self {
        self.annotation_macro = name.into();
        self
    }

    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }
}

/// The mixin compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with the given options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Run the full pipeline and write files when an output directory is set
    pub fn compile(&self) -> Result<CompileOutput> {
        info!(input = %self.options.input.display(), "compiling");

        let parse_options = ParseOptions::default().annotation_macro(&self.options.annotation_macro);
        let mut resolver = HeaderResolver::new(self.options.include_dirs.clone(), parse_options);
        resolver.resolve(&self.options.input)?;
        debug!(headers = resolver.len(), "resolved headers");

        let index = DeclarationIndex::build(resolver.headers().map(|h| &h.unit));

        // Only the entry file is scanned for annotations
        let annotated = match resolver.entry() {
            Some(entry) => annotated_members(&entry.unit),
            None => Vec::new(),
        };
        info!(members = annotated.len(), "found annotated members");

        let output = self.generate(&index, &annotated)?;

        if let Some(dir) = &self.options.output_dir {
            let written = output.write_to(dir)?;
            info!(files = written.len(), dir = %dir.display(), "wrote output");
        }

        Ok(output)
    }

    /// Compose every annotated member against `index`
    pub fn generate(&self, index: &DeclarationIndex, annotated: &[AnnotatedMember]) -> Result<CompileOutput> {
        let composer = ExtensionComposer::new(index);
        let mut extensions = Vec::new();
        let mut failures = Vec::new();

        for member in annotated {
            match composer.compose(member) {
                Ok(Some(extension)) => {
                    info!(owner = %extension.owner, category = %extension.identifier, "generated category");
                    extensions.push(extension);
                }
                Ok(None) => {}
                Err(e) => failures.push(e),
            }
        }

        let mut diagnostics = Vec::new();
        if !failures.is_empty() {
            if !self.options.keep_going {
                return Err(CompileError::from_many(failures));
            }
            for failure in &failures {
                warn!("skipped: {}", failure);
            }
            diagnostics = failures;
        }

        let mut declarations = String::new();
        let mut definitions = String::new();
        for (i, extension) in extensions.iter().enumerate() {
            if i > 0 {
                declarations.push('\n');
                definitions.push('\n');
            }
            declarations.push_str(&extension.declaration);
            definitions.push_str(&extension.definition);
        }

        let mut output = CompileOutput {
            source_file: self.options.input.clone(),
            declarations,
            definitions,
            extensions,
            files: BTreeMap::new(),
            diagnostics,
        };
        output.files = self.files(&output)?;
        Ok(output)
    }

    /// Per-category `.h` and `.m` files plus the manifest
    fn files(&self, output: &CompileOutput) -> Result<BTreeMap<String, String>> {
        let source = file_name(&self.options.input);
        let owner_header = match self.options.input.file_stem() {
            Some(stem) => format!("{}.h", stem.to_string_lossy()),
            None => source.clone(),
        };

        let mut files = BTreeMap::new();
        for extension in &output.extensions {
            let stem = file_stem(extension);

            let mut header = String::new();
            writeln!(header, "// Generated by mixinc from {}. Do not edit.", source)?;
            writeln!(header)?;
            writeln!(header, "#import \"{}\"", owner_header)?;
            writeln!(header)?;
            header.push_str(&extension.declaration);

            let mut implementation = String::new();
            writeln!(implementation, "// Generated by mixinc from {}. Do not edit.", source)?;
            writeln!(implementation)?;
            writeln!(implementation, "#import \"{}.h\"", stem)?;
            writeln!(implementation)?;
            implementation.push_str(&extension.definition);

            files.insert(format!("{}.h", stem), header);
            files.insert(format!("{}.m", stem), implementation);
        }

        files.insert(MANIFEST_FILE.to_string(), output.manifest().to_json()?);
        Ok(files)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
