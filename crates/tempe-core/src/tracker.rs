//! Change tracking between input set publications.
//!
//! The tracker decides *what* must be reconsidered; whether recompilation
//! is actually needed is left to the compile loop's staleness check.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::paths;
use crate::snapshot::{ChangeRecord, InputSetUpdate, OutputPathInputs, Snapshot};

/// Last accepted state, kept to diff against the next update.
#[derive(Debug, Clone)]
struct TrackedState {
    snapshot: Snapshot,
    output_path: OutputPathInputs,
}

/// Turns input set updates and file-change batches into versioned snapshots.
#[derive(Debug)]
pub struct ChangeTracker {
    output_subfolder: String,
    state: Option<TrackedState>,
    version: u64,
}

impl ChangeTracker {
    /// Create a tracker writing artifacts under `output_subfolder`.
    pub fn new(output_subfolder: impl Into<String>) -> Self {
        Self {
            output_subfolder: output_subfolder.into(),
            state: None,
            version: 0,
        }
    }

    /// Latest valid snapshot, if any.
    pub fn current(&self) -> Option<&Snapshot> {
        self.state.as_ref().map(|state| &state.snapshot)
    }

    /// Version of the last published snapshot (0 before the first).
    pub fn version(&self) -> u64 {
        self.version
    }

    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Process a new input set publication.
    ///
    /// If the output directory cannot be computed, an empty, invalid snapshot
    /// is returned and file-change processing is suspended until a valid
    /// update arrives.
    pub fn apply(&mut self, update: &InputSetUpdate) -> Snapshot {
        let version = self.next_version();

        let output_directory =
            match paths::output_directory(&update.output_path, &self.output_subfolder) {
                Ok(dir) => dir,
                Err(e) => {
                    tracing::warn!("Suspending design-time compilation: {}", e);
                    self.state = None;
                    return Snapshot::empty(version);
                }
            };

        let inputs = &update.input_set.inputs;
        for (first, second) in paths::colliding_inputs(&update.output_path.project_dir, inputs) {
            tracing::warn!(
                "{} and {} compile to the same artifact; the last one compiled wins",
                first.display(),
                second.display()
            );
        }

        let changed = match &self.state {
            None => checked(inputs),
            Some(previous) => {
                let promoted = update
                    .input_set
                    .shared_inputs
                    .difference(&previous.snapshot.shared_inputs)
                    .next()
                    .is_some();

                if promoted {
                    tracing::debug!("Shared inputs added, forcing rebuild of all inputs");
                    forced(inputs)
                } else if previous.output_path != update.output_path {
                    tracing::debug!("Output path properties changed, forcing rebuild of all inputs");
                    forced(inputs)
                } else {
                    inputs
                        .difference(&previous.snapshot.inputs)
                        .map(ChangeRecord::checked)
                        .collect()
                }
            }
        };

        let snapshot = Snapshot::new(
            &update.input_set,
            changed,
            output_directory,
            update.output_path.project_dir.clone(),
            version,
        );

        self.state = Some(TrackedState {
            snapshot: snapshot.clone(),
            output_path: update.output_path.clone(),
        });

        snapshot
    }

    /// Process a batch of changed file paths from the watch service.
    ///
    /// Returns `None` when there is no valid snapshot yet or no path in the
    /// batch is a known input.
    pub fn files_changed(&mut self, files: &[PathBuf]) -> Option<Snapshot> {
        let current = self.current()?.clone();

        let mut changed: BTreeSet<PathBuf> = BTreeSet::new();
        for file in files {
            if current.shared_inputs.contains(file) {
                changed.extend(current.inputs.iter().cloned());
            } else if current.inputs.contains(file) {
                changed.insert(file.clone());
            }
        }

        if changed.is_empty() {
            return None;
        }

        let version = self.next_version();
        let snapshot = current.with_changes(checked(&changed), version);
        if let Some(state) = self.state.as_mut() {
            state.snapshot = snapshot.clone();
        }
        Some(snapshot)
    }
}

fn checked(files: &BTreeSet<PathBuf>) -> Vec<ChangeRecord> {
    files.iter().map(ChangeRecord::checked).collect()
}

fn forced(files: &BTreeSet<PathBuf>) -> Vec<ChangeRecord> {
    files.iter().map(ChangeRecord::forced).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InputSet;

    fn output_path() -> OutputPathInputs {
        OutputPathInputs {
            project_dir: PathBuf::from("/proj"),
            root_namespace: "App".to_string(),
            intermediate_output_path: PathBuf::from("obj/Debug"),
        }
    }

    fn update(inputs: &[&str], shared: &[&str], version: u64) -> InputSetUpdate {
        InputSetUpdate {
            input_set: InputSet::new(inputs.iter().copied(), shared.iter().copied()),
            output_path: output_path(),
            version,
        }
    }

    fn files(snapshot: &Snapshot) -> Vec<(&str, bool)> {
        snapshot
            .changed_inputs
            .iter()
            .map(|c| (c.file.to_str().unwrap(), c.ignore_staleness_check))
            .collect()
    }

    #[test]
    fn test_first_snapshot_contains_every_input() {
        let mut tracker = ChangeTracker::new("TempPE");
        let snap = tracker.apply(&update(&["/proj/A.cs", "/proj/B.cs"], &[], 1));

        assert!(snap.is_valid());
        assert_eq!(snap.version, 1);
        assert_eq!(files(&snap), vec![("/proj/A.cs", false), ("/proj/B.cs", false)]);
        assert_eq!(snap.output_directory, PathBuf::from("/proj/obj/Debug/TempPE"));
    }

    #[test]
    fn test_colliding_inputs_are_both_kept() {
        let mut tracker = ChangeTracker::new("TempPE");
        let snapshot = tracker.apply(&update(&["/proj/Forms/Form1.cs", "/proj/Forms.Form1.cs"], &[], 1));

        assert_eq!(snapshot.changed_inputs.len(), 2);
        assert_eq!(snapshot.inputs.len(), 2);
    }

    #[test]
    fn test_shared_promotion_forces_all_inputs() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs", "/proj/B.cs"], &[], 1));
        let snap = tracker.apply(&update(&["/proj/A.cs", "/proj/B.cs"], &["/proj/S.cs"], 2));

        assert_eq!(files(&snap), vec![("/proj/A.cs", true), ("/proj/B.cs", true)]);
    }

    #[test]
    fn test_output_property_change_forces_all_inputs() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs"], &[], 1));

        let mut next = update(&["/proj/A.cs"], &[], 2);
        next.output_path.root_namespace = "Other".to_string();
        let snap = tracker.apply(&next);

        assert_eq!(files(&snap), vec![("/proj/A.cs", true)]);
    }

    #[test]
    fn test_only_new_inputs_are_added() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs"], &["/proj/S.cs"], 1));
        let snap = tracker.apply(&update(&["/proj/A.cs", "/proj/C.cs"], &["/proj/S.cs"], 2));

        assert_eq!(files(&snap), vec![("/proj/C.cs", false)]);
        assert_eq!(snap.inputs.len(), 2);
    }

    #[test]
    fn test_removed_shared_input_does_not_force() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs"], &["/proj/S.cs"], 1));
        let snap = tracker.apply(&update(&["/proj/A.cs"], &[], 2));

        assert!(snap.changed_inputs.is_empty());
    }

    #[test]
    fn test_invalid_output_path_suspends_file_changes() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs"], &[], 1));

        let mut broken = update(&["/proj/A.cs"], &[], 2);
        broken.output_path.project_dir = PathBuf::new();
        let snap = tracker.apply(&broken);

        assert!(!snap.is_valid());
        assert!(snap.changed_inputs.is_empty());
        assert!(tracker.files_changed(&[PathBuf::from("/proj/A.cs")]).is_none());

        // The next valid update starts over.
        let snap = tracker.apply(&update(&["/proj/A.cs"], &[], 3));
        assert_eq!(files(&snap), vec![("/proj/A.cs", false)]);
    }

    #[test]
    fn test_file_change_before_first_snapshot_is_ignored() {
        let mut tracker = ChangeTracker::new("TempPE");
        assert!(tracker.files_changed(&[PathBuf::from("/proj/A.cs")]).is_none());
        assert_eq!(tracker.version(), 0);
    }

    #[test]
    fn test_shared_file_change_expands_to_all_inputs() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs", "/proj/B.cs"], &["/proj/S.cs"], 1));
        let snap = tracker
            .files_changed(&[PathBuf::from("/proj/S.cs")])
            .unwrap();

        assert_eq!(files(&snap), vec![("/proj/A.cs", false), ("/proj/B.cs", false)]);
        assert_eq!(snap.version, 2);
    }

    #[test]
    fn test_input_file_change_adds_only_that_file() {
        let mut tracker = ChangeTracker::new("TempPE");
        tracker.apply(&update(&["/proj/A.cs", "/proj/B.cs"], &[], 1));
        let snap = tracker
            .files_changed(&[PathBuf::from("/proj/B.cs"), PathBuf::from("/proj/unknown.cs")])
            .unwrap();

        assert_eq!(files(&snap), vec![("/proj/B.cs", false)]);
    }
}
