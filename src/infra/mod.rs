pub mod citybikes;
