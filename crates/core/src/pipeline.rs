//! Patch pipeline orchestrator.
//!
//! A run is a strictly sequential chain of steps, each consuming the image
//! the previous one produced:
//!
//! 1. classify the header region
//! 2. clean the image to the region baseline (if its digest differs)
//! 3. verify the clean digest
//! 4. transition to the target region (if it differs), then verify
//! 5. apply the target patch (if any)
//! 6. verify against the caller's expected digest (if any)
//!
//! The first error ends the run; no partial image is ever returned.

use crate::baseline::BaselineRegistry;
use crate::engine::DiffEngine;
use crate::error::{IntegrityCheck, PatchError, PipelineError, Stage};
use crate::hashing::Digest;
use crate::model::{Image, PatchKey, Region};
use crate::region::{self, region_code, supported_list};
use crate::source::PatchSource;

/// What the caller wants the pipeline to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Region the output must be in. Defaults to the source image's region.
    pub target_region: Option<Region>,
    /// Location of the target (hack) patch, relative to the patch store.
    pub target_patch: Option<String>,
    /// Expected digest of the final image.
    pub expected_digest: Option<Digest>,
}

impl PipelineRequest {
    /// Clean only, keeping the image's own region.
    pub fn clean_only() -> Self {
        Self::default()
    }

    /// Apply the patch at `location`, authored against `region`.
    pub fn target(location: impl Into<String>, region: Region) -> Self {
        Self { target_region: Some(region), target_patch: Some(location.into()), expected_digest: None }
    }

    pub fn with_expected_digest(mut self, digest: Option<Digest>) -> Self {
        self.expected_digest = digest;
        self
    }

    pub fn with_target_region(mut self, region: Option<Region>) -> Self {
        self.target_region = region;
        self
    }
}

/// Details of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub image: Image,
    pub source_region: Region,
    pub source_digest: Digest,
    pub region: Region,
    pub cleaned: bool,
    pub transitioned: bool,
    pub patched: bool,
    pub digest: Digest,
}

/// Coordinator tying a patch source, the diff engine, and the baselines.
pub struct Pipeline<'a> {
    pub source: &'a dyn PatchSource,
    pub engine: &'a DiffEngine,
    pub baselines: &'a BaselineRegistry,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn PatchSource,
        engine: &'a DiffEngine,
        baselines: &'a BaselineRegistry,
    ) -> Self {
        Self { source, engine, baselines }
    }

    /// Run the pipeline and return the verified image.
    pub async fn run(&self, image: Image, request: &PipelineRequest) -> Result<Image, PipelineError> {
        self.run_detailed(image, request).await.map(|report| report.image)
    }

    /// Run the pipeline and return the image with a summary of what happened.
    pub async fn run_detailed(
        &self,
        image: Image,
        request: &PipelineRequest,
    ) -> Result<RunReport, PipelineError> {
        let source_region = self.classify(&image).map_err(at(Stage::Classify))?;
        let source_digest = image.digest();
        tracing::info!(region = %source_region, digest = %source_digest, "classified ROM");

        let (clean, cleaned) =
            self.ensure_clean(image, source_region, source_digest).await.map_err(at(Stage::Clean))?;
        self.verify_baseline(&clean, source_region, IntegrityCheck::Clean)
            .map_err(at(Stage::VerifyClean))?;

        let target_region = request.target_region.unwrap_or(source_region);
        let (in_region, transitioned) = self
            .ensure_region(clean, source_region, target_region)
            .await
            .map_err(at(Stage::Transition))?;

        let (patched, did_patch) = match request.target_patch.as_deref() {
            Some(location) => {
                let out = self.apply_target(in_region, location).await.map_err(at(Stage::TargetPatch))?;
                (out, true)
            }
            None => (in_region, false),
        };

        let digest = patched.digest();
        if let Some(expected) = request.expected_digest {
            tracing::info!(%expected, "validating checksum against expected digest");
            check_digest(digest, expected, IntegrityCheck::Final).map_err(at(Stage::FinalVerify))?;
        }

        Ok(RunReport {
            image: patched,
            source_region,
            source_digest,
            region: target_region,
            cleaned,
            transitioned,
            patched: did_patch,
            digest,
        })
    }

    /// Header region of `image`, restricted to regions with a baseline.
    pub fn classify(&self, image: &Image) -> Result<Region, PatchError> {
        let supported = self.baselines.regions();
        let region = region::classify(image).map_err(|e| match e {
            PatchError::UnsupportedRegion { found, .. } => {
                PatchError::UnsupportedRegion { found, supported: supported_list(&supported) }
            }
            other => other,
        })?;
        if !self.baselines.contains(region) {
            return Err(PatchError::UnsupportedRegion {
                found: Some(region_code(region)),
                supported: supported_list(&supported),
            });
        }
        Ok(region)
    }

    async fn ensure_clean(
        &self,
        image: Image,
        region: Region,
        current: Digest,
    ) -> Result<(Image, bool), PatchError> {
        let expected = self.baseline(region)?;
        tracing::info!(%current, %expected, "checking ROM against clean baseline");
        if current == expected {
            return Ok((image, false));
        }

        let key = PatchKey::Clean { region, digest: current };
        let diff = self.source.fetch(&key).await.map_err(|e| match e {
            // No patch will ever exist for an untracked dump.
            PatchError::PatchNotFound { .. } => PatchError::UnsupportedImage { digest: current },
            other => other,
        })?;
        tracing::info!(%key, "cleaning ROM");
        let cleaned = self.engine.apply(image, diff).await?;
        Ok((cleaned, true))
    }

    async fn ensure_region(
        &self,
        image: Image,
        from: Region,
        to: Region,
    ) -> Result<(Image, bool), PatchError> {
        tracing::info!(rom_region = %from, expected_region = %to, "checking ROM region");
        if from == to {
            return Ok((image, false));
        }

        let expected = self.baseline(to)?;
        let key = PatchKey::Transition { from, to };
        let diff = self.source.fetch(&key).await?;
        tracing::info!(%key, "transitioning ROM region");
        let out = self.engine.apply(image, diff).await?;
        check_digest(out.digest(), expected, IntegrityCheck::Transition)?;
        Ok((out, true))
    }

    async fn apply_target(&self, image: Image, location: &str) -> Result<Image, PatchError> {
        let key = PatchKey::Target { location: location.to_string() };
        let diff = self.source.fetch(&key).await?;
        tracing::info!(%key, "applying the ROM hack patch");
        self.engine.apply(image, diff).await
    }

    fn verify_baseline(
        &self,
        image: &Image,
        region: Region,
        check: IntegrityCheck,
    ) -> Result<(), PatchError> {
        let expected = self.baseline(region)?;
        check_digest(image.digest(), expected, check)
    }

    fn baseline(&self, region: Region) -> Result<Digest, PatchError> {
        self.baselines
            .expected_digest(region)
            .copied()
            .ok_or(PatchError::MissingBaseline { region })
    }
}

fn check_digest(actual: Digest, expected: Digest, check: IntegrityCheck) -> Result<(), PatchError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PatchError::Integrity { check, actual, expected })
    }
}

fn at(stage: Stage) -> impl Fn(PatchError) -> PipelineError {
    move |error| {
        tracing::error!(%stage, %error, "pipeline step failed");
        PipelineError::new(stage, error)
    }
}
