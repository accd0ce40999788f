//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Name of the environment variable read by [`DebugFlags::from_env`].
pub const DEBUG_ENV_VAR: &str = "BIR_DEBUG";

/// Debug switches that change what the compiler does or prints.
///
/// These are parsed from a comma-separated list of flag names, like
/// `"shaders,nosched"`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DebugFlags {
    /// Log the message-passing instructions as they are scheduled.
    pub msgs: bool,
    /// Print the program after every pipeline stage.
    pub shaders: bool,
    /// Print shader-db statistics once compilation finishes.
    pub shaderdb: bool,
    /// Put every instruction in its own clause.
    pub nosched: bool,
    /// Skip the initialization validator.
    pub novalidate: bool,
    /// Skip every optimization pass.
    pub noopt: bool,
    /// Shrink the register file to force spilling.
    pub spill: bool,
}

/// An unknown name was given to [`DebugFlags::parse`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebugFlagError {
    flag: String,
}

impl DebugFlagError {
    /// The flag that wasn't recognized.
    pub fn flag(&self) -> &str {
        &self.flag
    }
}

impl Display for DebugFlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown debug flag '{}', expected one of: {}",
            self.flag,
            DebugFlags::NAMES.join(", ")
        )
    }
}

impl Error for DebugFlagError {}

impl DebugFlags {
    /// Every flag name accepted by [`Self::parse`].
    pub const NAMES: [&'static str; 7] = [
        "msgs",
        "shaders",
        "shaderdb",
        "nosched",
        "novalidate",
        "noopt",
        "spill",
    ];

    /// Parses a comma-separated list of flag names. Empty entries and
    /// surrounding whitespace are ignored.
    ///
    /// ```
    /// # use bir::codegen::DebugFlags;
    /// let flags = DebugFlags::parse("shaders, noopt").unwrap();
    ///
    /// assert!(flags.shaders && flags.noopt);
    /// assert!(!flags.spill);
    /// assert!(DebugFlags::parse("shaders,bogus").is_err());
    /// ```
    pub fn parse(list: &str) -> Result<Self, DebugFlagError> {
        let mut flags = Self::default();

        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let flag = match name {
                "msgs" => &mut flags.msgs,
                "shaders" => &mut flags.shaders,
                "shaderdb" => &mut flags.shaderdb,
                "nosched" => &mut flags.nosched,
                "novalidate" => &mut flags.novalidate,
                "noopt" => &mut flags.noopt,
                "spill" => &mut flags.spill,
                _ => {
                    return Err(DebugFlagError {
                        flag: name.to_owned(),
                    })
                }
            };

            *flag = true;
        }

        Ok(flags)
    }

    /// Reads flags from the `BIR_DEBUG` environment variable. A missing
    /// variable means no flags.
    pub fn from_env() -> Result<Self, DebugFlagError> {
        match std::env::var(DEBUG_ENV_VAR) {
            Ok(list) => Self::parse(&list),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// The pipeline stage a shader runs in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Vertex => "VERTEX",
            Stage::Fragment => "FRAGMENT",
            Stage::Compute => "COMPUTE",
        };

        write!(f, "{name}")
    }
}

/// Everything about the compile that isn't part of the program itself.
#[derive(Clone, Debug)]
pub struct CompileInputs {
    /// Architecture major version, `7` through `9`.
    pub arch: u32,
    /// The stage the shader runs in.
    pub stage: Stage,
    /// Whether the shader being compiled is itself a blend shader.
    pub is_blend: bool,
    /// A label used when printing statistics.
    pub label: String,
    /// Debug switches.
    pub debug: DebugFlags,
}

impl Default for CompileInputs {
    fn default() -> Self {
        Self {
            arch: 7,
            stage: Stage::Fragment,
            is_blend: false,
            label: String::default(),
            debug: DebugFlags::default(),
        }
    }
}

impl CompileInputs {
    /// Whether optimization passes should run.
    pub fn optimize(&self) -> bool {
        !self.debug.noopt
    }
}
