mod mod_store;
