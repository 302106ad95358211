mod mod_catalog;
