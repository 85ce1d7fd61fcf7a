//! Reusable book templates
//!
//! Templates live as one JSON record per file in the store directory and
//! are cached in memory. Reads share the cache; create, update and delete
//! hold the write lock for their file I/O so edits never interleave.

mod apply;
mod defaults;
mod model;

pub use apply::{apply_template_properties, chapter_formatting, coloring_formatting};
pub use defaults::{BUILTIN_TEMPLATE_IDS, builtin_templates};
pub use model::{BookTemplate, NewTemplate, TemplateProperties, TemplateUpdate};

use chrono::{Local, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::render::write_atomic;
use crate::types::*;
use defaults::builtin_rank;

pub struct TemplateStore {
    dir: PathBuf,
    templates: RwLock<BTreeMap<String, BookTemplate>>,
}

/// Ids become file names, so only a conservative alphabet is accepted
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Deterministic listing order: built-ins first, then by creation time and id
fn sort_templates(templates: &mut [BookTemplate]) {
    templates.sort_by(|a, b| {
        let key = |t: &BookTemplate| (builtin_rank(&t.id).unwrap_or(usize::MAX), t.created_at);
        key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
    });
}

fn read_record(path: &Path) -> Result<BookTemplate> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        LayoutError::Template(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl TemplateStore {
    /// Open the store, creating the directory and loading every record in it.
    ///
    /// Unreadable records are logged and skipped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut templates = BTreeMap::new();
        for path in paths {
            match read_record(&path) {
                Ok(template) => {
                    templates.insert(template.id.clone(), template);
                }
                Err(e) => log::error!("Error loading template {}: {}", path.display(), e),
            }
        }
        log::info!("Loaded {} templates from {}", templates.len(), dir.display());

        Ok(Self {
            dir,
            templates: RwLock::new(templates),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, BookTemplate>> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, BookTemplate>> {
        self.templates.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn persist(&self, template: &BookTemplate) -> Result<()> {
        let json = serde_json::to_vec_pretty(template).map_err(|e| {
            LayoutError::Template(format!("Failed to serialize {}: {}", template.id, e))
        })?;
        write_atomic(&json, &self.dir, &self.record_path(&template.id))?;
        log::info!("Template {} saved", template.id);
        Ok(())
    }

    /// Persist a freshly created record, dropping its copied preview on failure
    fn persist_new(&self, template: &BookTemplate) -> Result<()> {
        let result = self.persist(template);
        if result.is_err() {
            if let Some(preview) = &template.preview_image {
                if let Err(e) = std::fs::remove_file(preview) {
                    log::warn!("Could not remove preview {}: {}", preview.display(), e);
                }
            }
        }
        result
    }

    /// Copy a preview image next to the record; missing sources are skipped
    fn store_preview(&self, id: &str, source: &Path) -> Option<PathBuf> {
        if !source.is_file() {
            log::warn!("Preview image {} not found", source.display());
            return None;
        }
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_ascii_lowercase();
        let dest = self.dir.join(format!("{id}_preview.{ext}"));
        match std::fs::copy(source, &dest) {
            Ok(_) => Some(dest),
            Err(e) => {
                log::error!("Error saving preview image: {}", e);
                None
            }
        }
    }

    /// All cached templates in listing order
    pub fn list(&self) -> Vec<BookTemplate> {
        let mut all: Vec<BookTemplate> = self.read().values().cloned().collect();
        sort_templates(&mut all);
        all
    }

    /// Look a template up in the cache, then on disk
    pub fn get_template(&self, id: &str) -> Option<BookTemplate> {
        if let Some(template) = self.read().get(id) {
            return Some(template.clone());
        }
        if !is_valid_id(id) {
            return None;
        }

        let path = self.record_path(id);
        if !path.is_file() {
            log::warn!("Template {} not found", id);
            return None;
        }
        match read_record(&path) {
            Ok(template) => {
                self.write().insert(template.id.clone(), template.clone());
                Some(template)
            }
            Err(e) => {
                log::error!("Error loading template {}: {}", id, e);
                None
            }
        }
    }

    /// Templates of a book type that match the optional filters, in listing order
    pub fn find_templates(
        &self,
        book_type: BookType,
        age_group: Option<AgeGroup>,
        trim_size: Option<TrimSize>,
    ) -> Vec<BookTemplate> {
        let mut found: Vec<BookTemplate> = self
            .read()
            .values()
            .filter(|t| t.book_type == book_type && t.matches(age_group, trim_size))
            .cloned()
            .collect();
        sort_templates(&mut found);
        found
    }

    /// Write any missing built-in templates. Returns how many were created.
    pub fn ensure_builtin_templates(&self) -> Result<usize> {
        let mut templates = self.write();
        let mut created = 0;
        for template in builtin_templates(Utc::now()) {
            if templates.contains_key(&template.id) {
                continue;
            }
            // An unreadable record still belongs to the user
            let path = self.record_path(&template.id);
            if path.exists() {
                log::warn!(
                    "Built-in template {} not recreated: {} exists but could not be loaded",
                    template.id,
                    path.display()
                );
                continue;
            }
            self.persist(&template)?;
            templates.insert(template.id.clone(), template);
            created += 1;
        }
        if created > 0 {
            log::info!("Created {} built-in templates", created);
        }
        Ok(created)
    }

    /// First template matching the filters.
    ///
    /// Falls back to the first template of the book type when nothing
    /// matches, and recreates the built-ins when there is none at all.
    pub fn get_default_template(
        &self,
        book_type: BookType,
        age_group: Option<AgeGroup>,
        trim_size: Option<TrimSize>,
    ) -> Result<BookTemplate> {
        if self.find_templates(book_type, None, None).is_empty() {
            self.ensure_builtin_templates()?;
        }

        if let Some(template) = self
            .find_templates(book_type, age_group, trim_size)
            .into_iter()
            .next()
        {
            return Ok(template);
        }

        self.find_templates(book_type, None, None)
            .into_iter()
            .next()
            .ok_or_else(|| {
                LayoutError::TemplateNotFound(format!("no {} template available", book_type))
            })
    }

    pub fn create_template(&self, new: NewTemplate) -> Result<BookTemplate> {
        if new.name.trim().is_empty() {
            return Err(LayoutError::InvalidInput(
                "template name is empty".to_string(),
            ));
        }

        let trim = new
            .trim_sizes
            .first()
            .map(|t| t.slug())
            .unwrap_or("any");
        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        let uid = uuid::Uuid::new_v4().simple().to_string();
        let id = format!(
            "template_{}_{}_{}_{}",
            new.book_type,
            trim,
            timestamp,
            &uid[..8]
        );

        let mut templates = self.write();
        let now = Utc::now();
        let preview_image = new
            .preview_image
            .as_deref()
            .and_then(|source| self.store_preview(&id, source));
        let template = BookTemplate {
            id: id.clone(),
            name: new.name,
            description: new.description,
            book_type: new.book_type,
            age_groups: new.age_groups,
            trim_sizes: new.trim_sizes,
            properties: new.properties,
            preview_image,
            created_at: now,
            updated_at: now,
        };

        self.persist_new(&template)?;
        templates.insert(id, template.clone());
        Ok(template)
    }

    /// Merge the provided fields into an existing template.
    ///
    /// `updated_at` is refreshed even when nothing else changes.
    pub fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<BookTemplate> {
        // Pull a disk-only record into the cache first
        if self.get_template(id).is_none() {
            return Err(LayoutError::TemplateNotFound(id.to_string()));
        }

        let mut templates = self.write();
        let mut template = templates
            .get(id)
            .cloned()
            .ok_or_else(|| LayoutError::TemplateNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            template.name = name;
        }
        if let Some(description) = update.description {
            template.description = description;
        }
        if let Some(age_groups) = update.age_groups {
            template.age_groups = age_groups;
        }
        if let Some(trim_sizes) = update.trim_sizes {
            template.trim_sizes = trim_sizes;
        }
        if let Some(properties) = update.properties {
            template.properties.merge(properties);
        }
        if let Some(source) = update.preview_image.as_deref() {
            if let Some(stored) = self.store_preview(id, source) {
                template.preview_image = Some(stored);
            }
        }
        template.updated_at = Utc::now();

        self.persist(&template)?;
        templates.insert(id.to_string(), template.clone());
        Ok(template)
    }

    /// Remove a template record and its stored preview.
    /// Returns false when no such template exists.
    pub fn delete_template(&self, id: &str) -> Result<bool> {
        let mut templates = self.write();
        let cached = templates.remove(id);

        let path = if is_valid_id(id) {
            Some(self.record_path(id))
        } else {
            None
        };
        let on_disk = path.as_ref().is_some_and(|p| p.is_file());
        if cached.is_none() && !on_disk {
            return Ok(false);
        }

        let mut preview = cached.and_then(|t| t.preview_image);
        if let Some(path) = path.filter(|_| on_disk) {
            if preview.is_none() {
                preview = read_record(&path).ok().and_then(|t| t.preview_image);
            }
            std::fs::remove_file(path)?;
        }

        if let Some(preview) = preview.filter(|p| p.starts_with(&self.dir) && p.is_file()) {
            if let Err(e) = std::fs::remove_file(&preview) {
                log::warn!("Could not remove preview {}: {}", preview.display(), e);
            }
        }

        log::info!("Template {} deleted", id);
        Ok(true)
    }
}
