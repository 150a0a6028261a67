use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::{Path, PathBuf};
use super::data::{BoxRect, ImageFile, PersonBox};
use crate::error::AppResult;

/// The Library manages the SQLite annotation database.
/// It stores imported images, known persons and the person boxes drawn on images.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the annotation database at `db_path` and initialize its schema.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        log::info!("📁 Database opened at: {}", db_path.display());

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Private database that disappears with the connection
    pub fn open_in_memory() -> SqlResult<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables if they don't exist.
    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS psa_image (
                image_id    INTEGER PRIMARY KEY,
                path        TEXT NOT NULL,
                author      VARCHAR(128) NOT NULL
            );

            CREATE TABLE IF NOT EXISTS psa_person (
                person_id   INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS psa_bbox (
                bbox_id     INTEGER PRIMARY KEY,
                image_id    INTEGER NOT NULL REFERENCES psa_image(image_id),
                person_id   INTEGER NOT NULL REFERENCES psa_person(person_id),
                x           INTEGER NOT NULL,
                y           INTEGER NOT NULL,
                width       INTEGER NOT NULL,
                height      INTEGER NOT NULL,
                hard        INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_bbox_image_id ON psa_bbox(image_id);
            CREATE INDEX IF NOT EXISTS idx_bbox_person_id ON psa_bbox(person_id);",
        )?;

        log::debug!("✅ Database schema initialized");

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Images ==========

    /// Get a count of images in the library
    pub fn image_count(&self) -> SqlResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM psa_image", [], |row| row.get(0))
    }

    /// Look up an image by its root-relative path.
    /// Returns `ImageFile::null()` if there is none.
    pub fn image_file(&self, path: &str) -> SqlResult<ImageFile> {
        let found = self
            .conn
            .query_row(
                "SELECT image_id, author FROM psa_image WHERE path = ?1
                 ORDER BY image_id DESC LIMIT 1",
                [path],
                |row| Ok(ImageFile::new(row.get(0)?, path, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(found.unwrap_or_else(ImageFile::null))
    }

    /// Insert a new image and return its ID
    pub fn add_image_file(&self, path: &str, author: &str) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO psa_image (path, author) VALUES (?1, ?2)",
            [path, author],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Register every path that is not in the library yet and return all of
    /// them, in the order given.
    pub fn add_and_query_image_files(&self, paths: &[String], author: &str) -> SqlResult<Vec<ImageFile>> {
        let mut image_files = Vec::with_capacity(paths.len());
        let mut added = 0;
        for path in paths {
            let mut image_file = self.image_file(path)?;
            if image_file.is_null() {
                image_file = ImageFile::new(self.add_image_file(path, author)?, path.as_str(), author);
                added += 1;
            }
            image_files.push(image_file);
        }

        log::info!(
            "📊 Import summary: {} new, {} already in library",
            added,
            paths.len() - added
        );

        Ok(image_files)
    }

    /// All images ordered by ID
    pub fn image_files(&self) -> SqlResult<Vec<ImageFile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT image_id, path, author FROM psa_image ORDER BY image_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ImageFile::new(row.get(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        rows.collect()
    }

    // ========== Persons ==========

    pub fn has_person(&self, person_id: i64) -> SqlResult<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM psa_person WHERE person_id = ?1",
                [person_id],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
    }

    /// Make sure a person row exists and return its ID.
    /// A non-positive `person_id` allocates a fresh one.
    pub fn add_person(&self, person_id: i64) -> SqlResult<i64> {
        if person_id <= 0 {
            self.conn.execute("INSERT INTO psa_person DEFAULT VALUES", [])?;
            return Ok(self.conn.last_insert_rowid());
        }
        if !self.has_person(person_id)? {
            self.conn
                .execute("INSERT INTO psa_person (person_id) VALUES (?1)", [person_id])?;
        }
        Ok(person_id)
    }

    /// All person IDs in ascending order
    pub fn person_ids(&self) -> SqlResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT person_id FROM psa_person ORDER BY person_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    fn remove_person(&self, person_id: i64) -> SqlResult<()> {
        self.conn
            .execute("DELETE FROM psa_person WHERE person_id = ?1", [person_id])?;
        Ok(())
    }

    // ========== Boxes ==========

    fn box_from_row(row: &Row<'_>) -> SqlResult<PersonBox> {
        Ok(PersonBox {
            id: row.get(0)?,
            image_id: row.get(1)?,
            person_id: row.get(2)?,
            rect: BoxRect::new(row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?),
            hard: row.get::<_, i64>(7)? != 0,
        })
    }

    /// Look up a box by ID. Returns `PersonBox::null()` if there is none.
    pub fn person_box(&self, box_id: i64) -> SqlResult<PersonBox> {
        let found = self
            .conn
            .query_row(
                "SELECT bbox_id, image_id, person_id, x, y, width, height, hard
                 FROM psa_bbox WHERE bbox_id = ?1",
                [box_id],
                Self::box_from_row,
            )
            .optional()?;
        Ok(found.unwrap_or_else(PersonBox::null))
    }

    /// All boxes drawn on an image, in storage order
    pub fn boxes_by_image(&self, image_id: i64) -> SqlResult<Vec<PersonBox>> {
        let mut stmt = self.conn.prepare(
            "SELECT bbox_id, image_id, person_id, x, y, width, height, hard
             FROM psa_bbox WHERE image_id = ?1 ORDER BY bbox_id",
        )?;
        let rows = stmt.query_map([image_id], Self::box_from_row)?;
        rows.collect()
    }

    /// All boxes of one person, in storage order
    pub fn boxes_by_person(&self, person_id: i64) -> SqlResult<Vec<PersonBox>> {
        let mut stmt = self.conn.prepare(
            "SELECT bbox_id, image_id, person_id, x, y, width, height, hard
             FROM psa_bbox WHERE person_id = ?1 ORDER BY bbox_id",
        )?;
        let rows = stmt.query_map([person_id], Self::box_from_row)?;
        rows.collect()
    }

    fn person_is_referenced(&self, person_id: i64) -> SqlResult<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM psa_bbox WHERE person_id = ?1 LIMIT 1",
                [person_id],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
    }

    /// Insert a box, creating its person first when needed.
    ///
    /// A box with a non-positive ID gets one allocated, otherwise its ID is kept.
    /// A box without a person gets a freshly allocated person.
    /// Returns the stored box.
    pub fn add_person_box(&self, person_box: &PersonBox) -> SqlResult<PersonBox> {
        let person_id = self.add_person(person_box.person_id)?;
        let rect = person_box.rect;

        if person_box.id <= 0 {
            self.conn.execute(
                "INSERT INTO psa_bbox (image_id, person_id, x, y, width, height, hard)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    person_box.image_id,
                    person_id,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    person_box.hard as i64,
                ],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO psa_bbox (bbox_id, image_id, person_id, x, y, width, height, hard)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    person_box.id,
                    person_box.image_id,
                    person_id,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    person_box.hard as i64,
                ],
            )?;
        }

        Ok(PersonBox {
            id: self.conn.last_insert_rowid(),
            person_id,
            ..*person_box
        })
    }

    /// Delete a box. Its person row is deleted too once no box references it.
    /// Returns false if there was no such box.
    pub fn remove_person_box(&self, box_id: i64) -> SqlResult<bool> {
        let existing = self.person_box(box_id)?;
        if existing.is_null() {
            return Ok(false);
        }

        self.conn
            .execute("DELETE FROM psa_bbox WHERE bbox_id = ?1", [box_id])?;

        if !self.person_is_referenced(existing.person_id)? {
            self.remove_person(existing.person_id)?;
        }
        Ok(true)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
