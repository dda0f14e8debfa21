#![allow(dead_code)]

use phpsense::indexing::path_to_uri;
use phpsense::{Settings, Workspace};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway PHP project on disk.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn uri(&self, path: &str) -> String {
        path_to_uri(&self.dir.path().join(path))
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Settings with the index kept inside the project directory.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.workspace_root = Some(self.path().to_path_buf());
        settings
    }

    /// Workspace persisted under the project's index directory.
    pub fn workspace(&self) -> Workspace {
        Workspace::open(self.settings()).expect("Failed to open workspace")
    }
}

/// Offset of the first occurrence of `needle` plus `delta`.
pub fn offset_of(source: &str, needle: &str, delta: u32) -> u32 {
    source.find(needle).expect("needle not in source") as u32 + delta
}

/// Offset of the last occurrence of `needle` plus `delta`.
pub fn last_offset_of(source: &str, needle: &str, delta: u32) -> u32 {
    source.rfind(needle).expect("needle not in source") as u32 + delta
}

pub mod sample_code {
    pub const FOO: &str = r#"<?php
function foo($a, $b) {}
foo(1, 2);
"#;

    pub const MODELS: &str = r#"<?php
namespace App\Models;

interface Persistable {
    public function save(): bool;
}

trait HasTimestamps {
    public function touch(): void {}
}

/** A registered user. */
class User implements Persistable {
    use HasTimestamps;

    const ROLE = 'user';
    public string $name;
    protected static int $count = 0;

    public function __construct(string $name) { $this->name = $name; }
    public function save(): bool { return true; }
    public static function create(string $name): static { return new static($name); }
}

class Admin extends User {
    const ROLE = 'admin';
    public function ban(User $user, string $reason = 'spam'): void {}
}

function make_admin(string $name): Admin { return new Admin($name); }
"#;

    pub const CONTROLLER: &str = r#"<?php
namespace App\Http;

use App\Models\Admin;
use App\Models\User;
use function App\Models\make_admin;

class UserController {
    public function store(User $user, Admin $admin): void {
        $user->save();
        $admin->ban($user, 'abuse');
        $admin->save();
        $admin->touch();
        $fresh = new Admin('x');
        $fresh->ban($user);
        echo Admin::ROLE;
        make_admin('y');
    }
}
"#;
}
