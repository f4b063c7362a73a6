// SPDX-License-Identifier: Apache-2.0

//! Geometric placement of a decision diagram onto a crossbar.

pub mod compact2d;
pub mod compact3d;
pub mod direct;
