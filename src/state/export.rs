//! Plain-text exports of the whole annotation database
//!
//! Both formats are tab separated, with one `# <id>` header per group:
//! - by person: `# <person_id>`, box count, then `path x y width height hard`
//! - by image:  `# <image_id>`, image path, box count, then `person_id x y width height hard`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rusqlite::params;

use super::library::Library;
use crate::error::AppResult;

impl Library {
    /// Write every person's boxes, grouped by person ID.
    pub fn export_by_person<W: Write>(&self, mut out: W) -> AppResult<()> {
        let mut stmt = self.connection().prepare(
            "SELECT psa_image.path, psa_bbox.x, psa_bbox.y,
                    psa_bbox.width, psa_bbox.height, psa_bbox.hard
             FROM psa_image, psa_bbox
             WHERE psa_image.image_id = psa_bbox.image_id AND psa_bbox.person_id = ?1
             ORDER BY psa_bbox.bbox_id",
        )?;

        for person_id in self.person_ids()? {
            let lines = stmt
                .query_map(params![person_id], |row| {
                    Ok(format!(
                        "{}\t{}\t{}\t{}\t{}\t{}",
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            writeln!(out, "# {}", person_id)?;
            writeln!(out, "{}", lines.len())?;
            for line in &lines {
                writeln!(out, "{}", line)?;
            }
        }

        out.flush()?;
        Ok(())
    }

    /// Write every image's boxes, grouped by image ID.
    pub fn export_by_image<W: Write>(&self, mut out: W) -> AppResult<()> {
        for image in self.image_files()? {
            let boxes = self.boxes_by_image(image.id)?;

            writeln!(out, "# {}", image.id)?;
            writeln!(out, "{}", image.path)?;
            writeln!(out, "{}", boxes.len())?;
            for b in &boxes {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    b.person_id,
                    b.rect.x,
                    b.rect.y,
                    b.rect.width,
                    b.rect.height,
                    b.hard as i32
                )?;
            }
        }

        out.flush()?;
        Ok(())
    }

    pub fn export_by_person_to_path(&self, path: &Path) -> AppResult<()> {
        self.export_by_person(BufWriter::new(File::create(path)?))?;
        log::info!("📝 Exported person annotations to {}", path.display());
        Ok(())
    }

    pub fn export_by_image_to_path(&self, path: &Path) -> AppResult<()> {
        self.export_by_image(BufWriter::new(File::create(path)?))?;
        log::info!("📝 Exported image annotations to {}", path.display());
        Ok(())
    }
}
