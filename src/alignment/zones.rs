use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::{TargetUser, UserDirectory};
use crate::alignment::{open_document, Editions};
use crate::document::DocId;
use crate::geometry::{bounding_box, fragment_url, parse_coords, BoundingBox, ImageRef, ImageService};
use crate::notes::check_content;
use crate::store::{ImageZone, ZoneScope, ZoneType};
use crate::types::actor::Actor;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{UserId, ZoneId};

/// A zone as drawn by a client. Coordinates arrive as a `"x1,y1,x2,y2,..."` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInput {
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    pub zone_type: ZoneType,
    pub coords: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl ZoneInput {
    pub fn new(zone_type: ZoneType, coords: impl Into<String>) -> Self {
        Self {
            zone_id: None,
            zone_type,
            coords: coords.into(),
            note: None,
        }
    }

    pub fn with_id(mut self, zone_id: ZoneId) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Image region cut out by one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub zone_id: ZoneId,
    pub coords: Vec<i64>,
    pub bbox: BoundingBox,
    pub fragment_url: String,
}

impl<U: UserDirectory> Editions<U> {
    /// Replaces the target's zones on `image`.
    ///
    /// Zones keep the id they are sent with; new zones get the next id of the scope. Image
    /// alignments pointing at a zone that is not part of the new set are dropped.
    pub fn save_zones(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        image: &ImageRef,
        zones: Vec<ZoneInput>,
    ) -> CoreResult<Vec<ImageZone>> {
        let user = self.target(actor, target)?;
        let mut parsed = Vec::with_capacity(zones.len());
        for zone in zones {
            let coords = parse_coords(&zone.coords)?;
            if let Some(note) = &zone.note {
                check_content(note, &self.config)?;
            }
            parsed.push((zone, coords));
        }
        let scope = ZoneScope {
            image: image.clone(),
            user_id: user,
        };
        let now = Utc::now();

        let (saved, dropped) = self.store.write(|tables| {
            open_document(tables, doc_id, now)?;
            tables.zones.retain(|(s, _), _| *s != scope);

            for zone_id in parsed.iter().filter_map(|(zone, _)| zone.zone_id) {
                tables.bump_zone_high_water(&scope, zone_id);
            }

            for (zone, coords) in parsed {
                let zone_id = match zone.zone_id {
                    Some(id) => id,
                    None => tables.next_zone_id(&scope)?,
                };
                let record = ImageZone {
                    image: image.clone(),
                    zone_id,
                    user_id: user,
                    zone_type: zone.zone_type,
                    coords,
                    note: zone.note,
                };
                if tables.zones.insert((scope.clone(), zone_id), record).is_some() {
                    return Err(CoreError::Conflict(format!("{zone_id} is used twice")));
                }
            }

            let dropped = tables.drop_dangling_image_edges();
            Ok((tables.zones_in(&scope).cloned().collect::<Vec<_>>(), dropped))
        })?;

        info!(doc = %doc_id, %user, zones = saved.len(), dropped_edges = dropped, "zones saved");
        Ok(saved)
    }

    pub fn delete_zone(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        image: &ImageRef,
        zone_id: ZoneId,
    ) -> CoreResult<()> {
        let user = self.target(actor, target)?;
        let scope = ZoneScope {
            image: image.clone(),
            user_id: user,
        };
        let now = Utc::now();

        let dropped = self.store.write(|tables| {
            open_document(tables, doc_id, now)?;
            if tables.zones.remove(&(scope.clone(), zone_id)).is_none() {
                return Err(CoreError::target_not_found(format!("{zone_id} of {user}")));
            }
            Ok(tables.drop_dangling_image_edges())
        })?;

        info!(doc = %doc_id, %user, %zone_id, dropped_edges = dropped, "zone deleted");
        Ok(())
    }

    pub fn zones(&self, actor: &Actor, target: &TargetUser, image: &ImageRef) -> CoreResult<Vec<ImageZone>> {
        let scope = ZoneScope {
            image: image.clone(),
            user_id: self.target(actor, target)?,
        };
        Ok(self.store.read(|tables| tables.zones_in(&scope).cloned().collect()))
    }

    /// Bounding boxes and IIIF fragment URLs of `user`'s zones on `image`.
    ///
    /// With `zone_id`, only that zone is returned and it must exist.
    pub fn image_fragments<S: ImageService + ?Sized>(
        &self,
        images: &S,
        image: &ImageRef,
        user: UserId,
        zone_id: Option<ZoneId>,
    ) -> CoreResult<Vec<Fragment>> {
        let info = images
            .image_info(image)
            .ok_or_else(|| CoreError::target_not_found(format!("image info of {}", image.manifest_url)))?;
        let scope = ZoneScope {
            image: image.clone(),
            user_id: user,
        };
        let zones: Vec<ImageZone> = self.store.read(|tables| {
            tables
                .zones_in(&scope)
                .filter(|zone| zone_id.map_or(true, |id| zone.zone_id == id))
                .cloned()
                .collect()
        });
        if let (Some(id), true) = (zone_id, zones.is_empty()) {
            return Err(CoreError::target_not_found(format!("{id} of {user}")));
        }

        let mut fragments = Vec::with_capacity(zones.len());
        for zone in zones {
            let bbox = bounding_box(&zone.coords, info.width, info.height)?;
            if self.config.skip_negative_fragments && (bbox.x < 0 || bbox.y < 0) {
                debug!(zone = %zone.zone_id, ?bbox, "fragment outside the image, skipped");
                continue;
            }
            fragments.push(Fragment {
                zone_id: zone.zone_id,
                fragment_url: fragment_url(&info.root_url, &bbox),
                coords: zone.coords,
                bbox,
            });
        }
        Ok(fragments)
    }

    /// Text shown for a zone: its own note, or the transcription segment aligned to it.
    pub fn zone_annotation_text(
        &self,
        image: &ImageRef,
        user: UserId,
        zone_id: ZoneId,
    ) -> CoreResult<Option<String>> {
        let scope = ZoneScope {
            image: image.clone(),
            user_id: user,
        };
        self.store.read(|tables| {
            let zone = tables
                .zone(&scope, zone_id)
                .ok_or_else(|| CoreError::target_not_found(format!("{zone_id} of {user}")))?;
            if zone.zone_type == ZoneType::Annotation {
                return Ok(zone.note.clone());
            }
            let Some(edge) = tables
                .image_edges
                .iter()
                .find(|e| e.user_id == user && e.image == *image && e.zone_id == zone_id)
            else {
                return Ok(None);
            };
            let text = tables.transcriptions.get(&edge.transcription_id);
            Ok(text.and_then(|t| edge.span.slice(&t.content)).map(str::to_owned))
        })
    }
}
