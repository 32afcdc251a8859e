pub mod cluster_members;
