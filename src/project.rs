use std::path::PathBuf;

use cargo_metadata;

use error::Error;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TargetKind {
    Lib,
    Bin,
    Example,
    Test,
    Bench
}

#[derive(Clone, Debug)]
pub struct CargoProject {
    pub packages: Vec< CargoPackage >
}

#[derive(Clone, Debug)]
pub struct CargoPackage {
    pub name: String,
    pub manifest_path: PathBuf,
    pub crate_root: PathBuf,
    pub targets: Vec< CargoTarget >
}

#[derive(Clone, Debug)]
pub struct CargoTarget {
    pub name: String,
    pub kind: TargetKind,
    pub source_path: PathBuf
}

impl CargoProject {
    pub fn new( manifest_path: Option< &str > ) -> Result< CargoProject, Error > {
        let metadata = cargo_metadata::metadata( manifest_path.map( std::path::Path::new ) )
            .map_err( |error| Error::ConfigurationError( format!( "cannot obtain cargo metadata: {}", error ) ) )?;

        Ok( CargoProject {
            packages: metadata.packages.into_iter().map( |package| {
                let manifest_path: PathBuf = package.manifest_path.into();
                CargoPackage {
                    name: package.name,
                    crate_root: manifest_path.parent().unwrap().into(),
                    manifest_path: manifest_path,
                    targets: package.targets.into_iter().filter_map( |target| {
                        let kind = match target.kind[ 0 ].as_str() {
                            "lib" => TargetKind::Lib,
                            "bin" => TargetKind::Bin,
                            "example" => TargetKind::Example,
                            "test" => TargetKind::Test,
                            "bench" => TargetKind::Bench,
                            other => {
                                debug!( "Skipping target {} of unhandled kind '{}'", target.name, other );
                                return None;
                            }
                        };
                        Some( CargoTarget {
                            name: target.name,
                            kind,
                            source_path: target.src_path.into()
                        })
                    }).collect()
                }
            }).collect()
        })
    }

    pub fn default_package( &self ) -> Result< &CargoPackage, Error > {
        self.packages.first().ok_or_else( || {
            Error::ConfigurationError( "no packages found in the project".to_owned() )
        })
    }

    pub fn package( &self, name: Option< &str > ) -> Result< &CargoPackage, Error > {
        match name {
            Some( name ) => {
                self.packages.iter().find( |package| package.name == name ).ok_or_else( || {
                    Error::ConfigurationError( format!( "package `{}` not found", name ) )
                })
            },
            None => self.default_package()
        }
    }
}

impl CargoPackage {
    /// The file a diagnostic about a missing `main` should point at.
    pub fn entry_path( &self ) -> PathBuf {
        self.targets.iter()
            .find( |target| target.kind == TargetKind::Bin )
            .map( |target| target.source_path.clone() )
            .unwrap_or_else( || self.crate_root.join( "src" ).join( "main.rs" ) )
    }
}
